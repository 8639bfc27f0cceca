use crate::error::{Result, WorkspaceError};
use std::fmt;

/// Stable identifier of a node in the file tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The type of file tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "File",
            NodeKind::Folder => "Folder",
        }
    }
}

/// A file or folder in the workspace tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Language tag, fixed when the file is created (files only)
    pub language: Option<String>,
    /// Ordered child ids (folders only)
    pub children: Option<Vec<NodeId>>,
    /// Back-reference to the containing folder, `None` at top level
    pub parent: Option<NodeId>,
}

impl FileSystemNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Check a proposed node name.
///
/// Names must be non-empty and use only `[A-Za-z0-9_.-]`. Files also need an
/// extension.
pub fn validate_name(name: &str, kind: NodeKind) -> Result<()> {
    if name.trim().is_empty() {
        return Err(WorkspaceError::validation(
            "Invalid name",
            "Name cannot be empty",
        ));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
    if !name.chars().all(allowed) {
        return Err(WorkspaceError::validation(
            "Invalid name",
            "Name can only contain letters, numbers, underscores, hyphens, and periods",
        ));
    }

    if kind == NodeKind::File && !name.contains('.') {
        return Err(WorkspaceError::validation(
            "Invalid file name",
            "File must have an extension (e.g., .js, .txt)",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_name("index.js", NodeKind::File).is_ok());
        assert!(validate_name("my-folder_2", NodeKind::Folder).is_ok());
        assert!(validate_name(".env", NodeKind::File).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(
            validate_name("", NodeKind::Folder),
            Err(WorkspaceError::Validation { .. })
        ));
        assert!(matches!(
            validate_name("   ", NodeKind::Folder),
            Err(WorkspaceError::Validation { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_characters() {
        let err = validate_name("bad name!", NodeKind::File).unwrap_err();
        assert_eq!(err.title(), "Invalid name");
        assert!(validate_name("a/b.js", NodeKind::File).is_err());
        assert!(validate_name("café.js", NodeKind::File).is_err());
    }

    #[test]
    fn test_file_needs_extension() {
        let err = validate_name("Makefile", NodeKind::File).unwrap_err();
        assert_eq!(err.title(), "Invalid file name");
        assert!(validate_name("Makefile", NodeKind::Folder).is_ok());
    }
}
