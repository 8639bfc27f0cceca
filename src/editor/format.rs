//! Brace-depth re-indentation.

/// Re-indent `source` by bracket nesting, `tab_width` spaces per level.
///
/// Brackets inside string literals and `//` comments are ignored. Blank
/// lines become empty and trailing whitespace is dropped. A trailing
/// newline is kept if the input had one.
pub fn reindent(source: &str, tab_width: usize) -> String {
    let unit = " ".repeat(tab_width.max(1));
    let mut depth: usize = 0;
    let mut scan = Scanner::default();
    let mut out = Vec::new();

    for line in source.lines() {
        let body = line.trim();
        if body.is_empty() {
            out.push(String::new());
            scan.end_line();
            continue;
        }

        // Leading closers pull the line itself out one level
        let closers = if scan.in_string() {
            0
        } else {
            body.chars().take_while(|c| matches!(c, '}' | ']' | ')')).count()
        };
        let level = depth.saturating_sub(closers);

        if scan.in_string() {
            // Continuation of a template literal: leave it alone
            out.push(line.trim_end().to_string());
        } else {
            out.push(format!("{}{}", unit.repeat(level), body));
        }

        let delta = scan.net_brackets(body);
        depth = if delta < 0 {
            depth.saturating_sub(delta.unsigned_abs())
        } else {
            depth + delta as usize
        };
        scan.end_line();
    }

    let mut formatted = out.join("\n");
    if source.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}

/// Tracks string state across a line, and across lines for backticks
#[derive(Debug, Default)]
struct Scanner {
    quote: Option<char>,
}

impl Scanner {
    fn in_string(&self) -> bool {
        self.quote == Some('`')
    }

    fn end_line(&mut self) {
        // Only template literals span lines
        if self.quote != Some('`') {
            self.quote = None;
        }
    }

    fn net_brackets(&mut self, line: &str) -> isize {
        let mut net = 0;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match self.quote {
                Some(q) => {
                    if c == '\\' {
                        chars.next();
                    } else if c == q {
                        self.quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' | '`' => self.quote = Some(c),
                    '/' if chars.peek() == Some(&'/') => break,
                    '{' | '[' | '(' => net += 1,
                    '}' | ']' | ')' => net -= 1,
                    _ => {}
                },
            }
        }
        net
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindent_blocks() {
        let source = "function greet(name) {\nif (name) {\nreturn `Hi ${name}`;\n}\n}\n";
        assert_eq!(
            reindent(source, 2),
            "function greet(name) {\n  if (name) {\n    return `Hi ${name}`;\n  }\n}\n"
        );
    }

    #[test]
    fn test_reindent_tab_width_and_blank_lines() {
        let source = "const a = [\n1,   \n\n   2,\n];";
        assert_eq!(reindent(source, 4), "const a = [\n    1,\n\n    2,\n];");
    }

    #[test]
    fn test_brackets_in_strings_and_comments() {
        let source = "const s = \"{\";\n// {\nlet x = 1;";
        assert_eq!(reindent(source, 2), "const s = \"{\";\n// {\nlet x = 1;");
    }

    #[test]
    fn test_else_on_closing_line() {
        let source = "if (a) {\nx();\n} else {\ny();\n}";
        assert_eq!(reindent(source, 2), "if (a) {\n  x();\n} else {\n  y();\n}");
    }

    #[test]
    fn test_unbalanced_closers_do_not_underflow() {
        assert_eq!(reindent("}\n}\nfoo();", 2), "}\n}\nfoo();");
    }

    #[test]
    fn test_multiline_template_is_kept() {
        let source = "const t = `\n   {raw\n`;\nx();";
        assert_eq!(reindent(source, 2), "const t = `\n   {raw\n`;\nx();");
    }
}
