/// Supplies the initial text of a file when it is opened in a tab
pub trait ContentSource {
    fn content_for(&self, name: &str) -> Option<&str>;
}

/// Bundled sample contents for the seeded workspace files
#[derive(Debug, Clone, Copy, Default)]
pub struct SnippetLibrary;

impl SnippetLibrary {
    pub fn new() -> Self {
        Self
    }
}

impl ContentSource for SnippetLibrary {
    fn content_for(&self, name: &str) -> Option<&str> {
        let text = match name {
            "index.js" => include_str!("../../assets/snippets/index.js"),
            "styles.css" => include_str!("../../assets/snippets/styles.css"),
            "Button.jsx" => include_str!("../../assets/snippets/Button.jsx"),
            "Card.jsx" => include_str!("../../assets/snippets/Card.jsx"),
            "index.html" => include_str!("../../assets/snippets/index.html"),
            "README.md" => include_str!("../../assets/snippets/README.md"),
            "package.json" => include_str!("../../assets/snippets/package.json"),
            _ => return None,
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_snippets() {
        let lib = SnippetLibrary::new();
        assert!(lib.content_for("index.js").unwrap().contains("DOMContentLoaded"));
        assert!(lib.content_for("package.json").unwrap().contains("nebulacode-studio"));
        assert!(lib.content_for("Card.jsx").unwrap().contains("glassmorphism"));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(SnippetLibrary::new().content_for("main.rs"), None);
    }
}
