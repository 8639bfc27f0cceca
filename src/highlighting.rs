//! Syntax highlighting module using syntect
//!
//! Language tags are first normalised with [`language::highlighter_language`],
//! then mapped to a syntect syntax. Extra `.sublime-syntax` files are loaded
//! from `<config_dir>/nebula/syntaxes/` and extra `.tmTheme` files from
//! `<config_dir>/nebula/themes/`.

use crate::language;
use ratatui::style::Color;
use std::path::{Path, PathBuf};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxDefinition, SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Manages syntax highlighting resources
pub struct HighlightingManager {
    /// Syntax definitions
    pub syntax_set: SyntaxSet,
    /// Color themes
    pub theme_set: ThemeSet,
}

impl HighlightingManager {
    /// Create a new highlighting manager with default and user syntaxes/themes
    pub fn new() -> Self {
        let mut syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();

        if let Some(config_dir) = Self::config_dir() {
            let syntaxes_dir = config_dir.join("syntaxes");
            if syntaxes_dir.is_dir() {
                let mut builder = syntax_set.into_builder();
                for path in files_with_extension(&syntaxes_dir, "sublime-syntax") {
                    match load_syntax(&path) {
                        Ok(syntax) => builder.add(syntax),
                        Err(e) => log::warn!("Skipping syntax {}: {}", path.display(), e),
                    }
                }
                syntax_set = builder.build();
            }

            let themes_dir = config_dir.join("themes");
            for path in files_with_extension(&themes_dir, "tmTheme") {
                match ThemeSet::get_theme(&path) {
                    Ok(theme) => {
                        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                            theme_set.themes.insert(name.to_string(), theme);
                        }
                    }
                    Err(e) => log::warn!("Skipping theme {}: {}", path.display(), e),
                }
            }
        }

        Self {
            syntax_set,
            theme_set,
        }
    }

    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nebula"))
    }

    /// Syntect syntax name for a highlighter language id
    fn syntax_name(id: &str) -> Option<&'static str> {
        let name = match id {
            // The bundled set has no TypeScript or JSX grammar
            "javascript" | "jsx" | "typescript" | "tsx" => "JavaScript",
            "css" => "CSS",
            "html" => "HTML",
            "python" => "Python",
            "java" => "Java",
            "c" => "C",
            "cpp" => "C++",
            "csharp" => "C#",
            "rust" => "Rust",
            "go" => "Go",
            "markdown" => "Markdown",
            "json" => "JSON",
            "yaml" => "YAML",
            "bash" => "Bourne Again Shell (bash)",
            "sql" => "SQL",
            "php" => "PHP",
            "ruby" => "Ruby",
            _ => return None,
        };
        Some(name)
    }

    /// Find a syntax for a tab's language tag
    pub fn syntax_for_language(&self, tag: &str) -> Option<&SyntaxReference> {
        let id = language::highlighter_language(tag);
        Self::syntax_name(id)
            .and_then(|name| self.syntax_set.find_syntax_by_name(name))
            .or_else(|| self.syntax_set.find_syntax_by_extension(tag))
    }

    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.theme_set.themes.get(name)
    }

    /// Highlight the first `line_limit` lines of `text`.
    ///
    /// Parse state carries across lines, so block comments and template
    /// strings color correctly. Returns `None` for plain text or an unknown
    /// theme.
    pub fn highlight(
        &self,
        text: &str,
        tag: &str,
        theme_name: &str,
        line_limit: usize,
    ) -> Option<Vec<Vec<StyledSpan>>> {
        let syntax = self.syntax_for_language(tag)?;
        let theme = self.theme(theme_name)?;
        let mut highlighter = HighlightLines::new(syntax, theme);

        let mut lines = Vec::new();
        for line in LinesWithEndings::from(text).take(line_limit) {
            let ranges = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => ranges,
                Err(e) => {
                    log::debug!("Highlighting stopped: {}", e);
                    return None;
                }
            };
            let spans = ranges
                .into_iter()
                .map(|(style, piece)| StyledSpan {
                    text: piece.trim_end_matches(['\n', '\r']).to_string(),
                    style: HighlightStyle {
                        fg: Some(Color::Rgb(
                            style.foreground.r,
                            style.foreground.g,
                            style.foreground.b,
                        )),
                        bold: style.font_style.contains(FontStyle::BOLD),
                        italic: style.font_style.contains(FontStyle::ITALIC),
                        underline: style.font_style.contains(FontStyle::UNDERLINE),
                    },
                })
                .filter(|span| !span.text.is_empty())
                .collect();
            lines.push(spans);
        }
        Some(lines)
    }
}

impl Default for HighlightingManager {
    fn default() -> Self {
        Self::new()
    }
}

fn load_syntax(path: &Path) -> anyhow::Result<SyntaxDefinition> {
    let text = std::fs::read_to_string(path)?;
    let name = path.file_stem().and_then(|s| s.to_str());
    Ok(SyntaxDefinition::load_from_str(&text, true, name)?)
}

fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == ext))
        .collect()
}

/// A styled span of text for rendering
#[derive(Debug, Clone, Default)]
pub struct StyledSpan {
    pub text: String,
    pub style: HighlightStyle,
}

/// Simplified highlight style for ratatui conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightStyle {
    pub fg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_lookup() {
        let manager = HighlightingManager::new();
        assert_eq!(manager.syntax_for_language("javascript").unwrap().name, "JavaScript");
        assert_eq!(manager.syntax_for_language("jsx").unwrap().name, "JavaScript");
        assert_eq!(manager.syntax_for_language("css").unwrap().name, "CSS");
        assert_eq!(manager.syntax_for_language("yml").unwrap().name, "YAML");
        assert_eq!(manager.syntax_for_language("markdown").unwrap().name, "Markdown");
    }

    #[test]
    fn test_highlight_lines() {
        let manager = HighlightingManager::new();
        let lines = manager
            .highlight("const x = 1;\n/* a\nb */\nx;", "javascript", "base16-ocean.dark", 3)
            .unwrap();
        assert_eq!(lines.len(), 3);
        let first: String = lines[0].iter().map(|s| s.text.as_str()).collect();
        assert_eq!(first, "const x = 1;");
        assert!(lines[0].iter().all(|s| s.style.fg.is_some()));
    }

    #[test]
    fn test_unknown_theme() {
        let manager = HighlightingManager::new();
        assert!(manager.highlight("x", "javascript", "no-such-theme", 10).is_none());
    }
}
