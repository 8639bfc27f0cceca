//! Tokenizer for the script subset.
//!
//! Handles:
//! - Numbers (decimal, exponent, `0x`/`0b`/`0o`)
//! - String literals with escapes
//! - Template literals, keeping `${...}` sources for the parser
//! - Line and block comments

use super::parser::MAX_NESTING;
use super::ExecutionError;

// =============================================================================
// Token Types
// =============================================================================

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    /// Template literal: `strings.len() == exprs.len() + 1`
    Template {
        strings: Vec<String>,
        exprs: Vec<(String, usize)>,
    },
    /// Identifier or keyword
    Ident(String),
    Punct(&'static str),
    Eof,
}

/// A token with the line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// Longest operators first so that matching is greedy
const PUNCTUATORS: &[&str] = &[
    ">>>=", "===", "!==", "**=", "...", ">>>", "<<=", ">>=", "=>", "==", "!=", "<=", ">=", "&&",
    "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<",
    ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|",
    "^", "!", "~", "?", ":", "=", ".",
];

// =============================================================================
// Lexer
// =============================================================================

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    /// Template literals currently open
    templates: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self::starting_at(input, 1)
    }

    /// Lexer for a fragment that begins on a later line of the program
    pub fn starting_at(input: &str, line: usize) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line,
            templates: 0,
        }
    }

    /// Tokenize the whole input. The last token is always [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, ExecutionError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let line = self.line;
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(Spanned { token, line });
            if done {
                return Ok(tokens);
            }
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ExecutionError {
        ExecutionError::Syntax {
            message: message.into(),
            line: self.line,
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ExecutionError> {
        loop {
            match (self.current(), self.peek(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while self.current().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    loop {
                        match self.current() {
                            None => return Err(self.error("Unterminated comment")),
                            Some('*') if self.peek(1) == Some('/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ExecutionError> {
        let Some(c) = self.current() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() || (c == '.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.read_number();
        }
        if c == '"' || c == '\'' {
            return self.read_string(c);
        }
        if c == '`' {
            return self.read_template();
        }
        if is_ident_start(c) {
            let start = self.pos;
            while self.current().is_some_and(is_ident_part) {
                self.pos += 1;
            }
            return Ok(Token::Ident(self.chars[start..self.pos].iter().collect()));
        }

        for punct in PUNCTUATORS {
            if self.matches(punct) {
                // `a?.5:0` is a conditional, not optional chaining
                if *punct == "?." && self.peek(2).is_some_and(|d| d.is_ascii_digit()) {
                    continue;
                }
                self.pos += punct.chars().count();
                return Ok(Token::Punct(*punct));
            }
        }

        Err(self.error(format!("Invalid or unexpected token '{}'", c)))
    }

    fn matches(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i) == Some(c))
    }

    fn read_number(&mut self) -> Result<Token, ExecutionError> {
        let radix = match (self.current(), self.peek(1)) {
            (Some('0'), Some('x' | 'X')) => 16,
            (Some('0'), Some('b' | 'B')) => 2,
            (Some('0'), Some('o' | 'O')) => 8,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let start = self.pos;
            while self.current().is_some_and(|c| c.is_digit(radix)) {
                self.pos += 1;
            }
            let digits: String = self.chars[start..self.pos].iter().collect();
            return u64::from_str_radix(&digits, radix)
                .map(|n| Token::Number(n as f64))
                .map_err(|_| self.error("Invalid number literal"));
        }

        let start = self.pos;
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.current() == Some('.') {
            self.pos += 1;
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.current(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek(1), Some('+' | '-')));
            if self.peek(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        if self.current().is_some_and(is_ident_start) {
            return Err(self.error("Invalid or unexpected token"));
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error("Invalid number literal"))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, ExecutionError> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.current() {
                None | Some('\n') => return Err(self.error("Invalid or unexpected token")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(Token::Str(text));
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(c) = self.read_escape()? {
                        text.push(c);
                    }
                }
                Some(c) => {
                    self.pos += 1;
                    text.push(c);
                }
            }
        }
    }

    /// Read the escape after a backslash. `None` for a line continuation.
    fn read_escape(&mut self) -> Result<Option<char>, ExecutionError> {
        let Some(c) = self.bump() else {
            return Err(self.error("Invalid or unexpected token"));
        };
        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            '\n' => return Ok(None),
            'x' => self.read_code_point(2)?,
            'u' if self.current() == Some('{') => {
                self.pos += 1;
                let start = self.pos;
                while self.current().is_some_and(|c| c != '}') {
                    self.pos += 1;
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error("Invalid Unicode escape sequence"))?
            }
            'u' => self.read_code_point(4)?,
            other => other,
        };
        Ok(Some(escaped))
    }

    fn read_code_point(&mut self, len: usize) -> Result<char, ExecutionError> {
        let end = (self.pos + len).min(self.chars.len());
        let digits: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("Invalid hexadecimal escape sequence"))
    }

    fn read_template(&mut self) -> Result<Token, ExecutionError> {
        if self.templates >= MAX_NESTING {
            return Err(self.error("Template literal is nested too deeply"));
        }
        self.templates += 1;
        let result = self.read_template_body();
        self.templates -= 1;
        result
    }

    fn read_template_body(&mut self) -> Result<Token, ExecutionError> {
        self.pos += 1;
        let mut strings = Vec::new();
        let mut exprs = Vec::new();
        let mut text = String::new();

        loop {
            match self.current() {
                None => return Err(self.error("Unterminated template literal")),
                Some('`') => {
                    self.pos += 1;
                    strings.push(text);
                    return Ok(Token::Template { strings, exprs });
                }
                Some('\\') => {
                    self.pos += 1;
                    if let Some(c) = self.read_escape()? {
                        text.push(c);
                    }
                }
                Some('$') if self.peek(1) == Some('{') => {
                    self.pos += 2;
                    strings.push(std::mem::take(&mut text));
                    let line = self.line;
                    let source = self.read_substitution()?;
                    exprs.push((source, line));
                }
                Some(_) => {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
            }
        }
    }

    /// Raw source of a `${...}` substitution, with nested braces balanced
    fn read_substitution(&mut self) -> Result<String, ExecutionError> {
        let start = self.pos;
        let mut depth = 0usize;
        loop {
            match self.current() {
                None => return Err(self.error("Unterminated template literal")),
                Some('}') if depth == 0 => {
                    let source = self.chars[start..self.pos].iter().collect();
                    self.pos += 1;
                    return Ok(source);
                }
                Some('}') => depth -= 1,
                Some('{') => depth += 1,
                Some(q @ ('"' | '\'')) => {
                    self.read_string(q)?;
                    continue;
                }
                Some('`') => {
                    self.read_template()?;
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_nested_templates_are_limited() {
        let shallow = format!("{}1{}", "`${".repeat(10), "}`".repeat(10));
        assert!(Lexer::new(&shallow).tokenize().is_ok());

        let deep = format!("{}1{}", "`${".repeat(MAX_NESTING + 1), "}`".repeat(MAX_NESTING + 1));
        let err = Lexer::new(&deep).tokenize().unwrap_err();
        assert!(matches!(err, ExecutionError::Syntax { .. }));
    }

    #[test]
    fn test_simple_call() {
        assert_eq!(
            tokens("console.log(1+1)"),
            vec![
                Token::Ident("console".into()),
                Token::Punct("."),
                Token::Ident("log".into()),
                Token::Punct("("),
                Token::Number(1.0),
                Token::Punct("+"),
                Token::Number(1.0),
                Token::Punct(")"),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_greedy_operators() {
        assert_eq!(
            tokens("a === b !== c => d"),
            vec![
                Token::Ident("a".into()),
                Token::Punct("==="),
                Token::Ident("b".into()),
                Token::Punct("!=="),
                Token::Ident("c".into()),
                Token::Punct("=>"),
                Token::Ident("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("0xff")[0], Token::Number(255.0));
        assert_eq!(tokens("1.5e3")[0], Token::Number(1500.0));
        assert_eq!(tokens(".25")[0], Token::Number(0.25));
        assert!(Lexer::new("12abc").tokenize().is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(tokens(r#""a\tb\n""#)[0], Token::Str("a\tb\n".into()));
        assert_eq!(tokens(r"'it\'s'")[0], Token::Str("it's".into()));
        assert_eq!(tokens(r#""A\x42""#)[0], Token::Str("AB".into()));
    }

    #[test]
    fn test_template_literal() {
        let toks = tokens("`sum: ${a + {b: 1}.b} done`");
        assert_eq!(
            toks[0],
            Token::Template {
                strings: vec!["sum: ".into(), " done".into()],
                exprs: vec![("a + {b: 1}.b".into(), 1)],
            }
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let spanned = Lexer::new("// note\nx /* a\nb */ y").tokenize().unwrap();
        assert_eq!(spanned[0].token, Token::Ident("x".into()));
        assert_eq!(spanned[0].line, 2);
        assert_eq!(spanned[1].token, Token::Ident("y".into()));
        assert_eq!(spanned[1].line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert!(matches!(err, ExecutionError::Syntax { line: 1, .. }));
    }
}
