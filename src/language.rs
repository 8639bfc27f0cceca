//! Language tags for files and the highlighter.
//!
//! Two tables live here. The creation table fixes a file's language tag when
//! the node is created; the highlighter table maps any tag (or bare
//! extension) to the identifier the syntax highlighter understands.

/// Lowercased extension of a file name, if it has one
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

/// Language tag assigned to a newly created file.
///
/// Unknown extensions map to themselves, so `main.rs` is tagged `rs`.
pub fn language_for_name(name: &str) -> String {
    let ext = extension(name).unwrap_or_default();
    match ext.as_str() {
        "js" => "javascript".to_string(),
        "jsx" => "jsx".to_string(),
        "ts" => "typescript".to_string(),
        "tsx" => "tsx".to_string(),
        "css" => "css".to_string(),
        "html" => "html".to_string(),
        "py" => "python".to_string(),
        "md" => "markdown".to_string(),
        _ => ext,
    }
}

/// Highlighter language identifier for a tag or extension
pub fn highlighter_language(tag: &str) -> &'static str {
    match tag.to_lowercase().as_str() {
        "js" | "javascript" => "javascript",
        "jsx" => "jsx",
        "ts" | "typescript" => "typescript",
        "tsx" => "tsx",
        "css" => "css",
        "html" => "html",
        "py" | "python" => "python",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "cs" => "csharp",
        "rust" => "rust",
        "go" => "go",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "sh" | "bash" => "bash",
        "sql" => "sql",
        "php" => "php",
        "rb" | "ruby" => "ruby",
        _ => "plaintext",
    }
}

/// Human readable name shown in the status bar
pub fn display_name(tag: &str) -> &'static str {
    match highlighter_language(tag) {
        "javascript" => "JavaScript",
        "jsx" => "JavaScript (JSX)",
        "typescript" => "TypeScript",
        "tsx" => "TypeScript (TSX)",
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
        "bash" => "Shell",
        "sql" => "SQL",
        "php" => "PHP",
        "ruby" => "Ruby",
        _ => "Plain Text",
    }
}

/// Default file extension for a scratch buffer of the given language
pub fn default_extension(tag: &str) -> &'static str {
    match highlighter_language(tag) {
        "javascript" => "js",
        "jsx" => "jsx",
        "typescript" => "ts",
        "tsx" => "tsx",
        "css" => "css",
        "html" => "html",
        "python" => "py",
        "java" => "java",
        "c" => "c",
        "cpp" => "cpp",
        "csharp" => "cs",
        "rust" => "rs",
        "go" => "go",
        "markdown" => "md",
        "json" => "json",
        "yaml" => "yaml",
        "bash" => "sh",
        "sql" => "sql",
        "php" => "php",
        "ruby" => "rb",
        _ => "txt",
    }
}

/// Languages offered by the settings panel as the default for new buffers
pub const DEFAULT_LANGUAGE_CHOICES: &[&str] = &[
    "javascript",
    "typescript",
    "html",
    "css",
    "python",
    "java",
    "c",
    "cpp",
    "go",
    "rust",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_table() {
        assert_eq!(language_for_name("index.js"), "javascript");
        assert_eq!(language_for_name("App.TSX"), "tsx");
        assert_eq!(language_for_name("notes.md"), "markdown");
        assert_eq!(language_for_name("main.rs"), "rs");
        assert_eq!(language_for_name("archive.tar.gz"), "gz");
    }

    #[test]
    fn test_highlighter_table() {
        assert_eq!(highlighter_language("js"), "javascript");
        assert_eq!(highlighter_language("yml"), "yaml");
        assert_eq!(highlighter_language("sh"), "bash");
        assert_eq!(highlighter_language("rb"), "ruby");
        assert_eq!(highlighter_language("cs"), "csharp");
        assert_eq!(highlighter_language("Markdown"), "markdown");
        assert_eq!(highlighter_language("brainfuck"), "plaintext");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.JSON").as_deref(), Some("json"));
        assert_eq!(extension("Makefile"), None);
    }
}
