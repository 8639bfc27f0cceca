//! Error types for the workspace stores.
//!
//! Every variant is recoverable: the host reports it as a notification or a
//! terminal entry and carries on.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    /// A bad name or a missing extension. No state was changed.
    #[error("{title}: {message}")]
    Validation { title: String, message: String },

    /// A stale id reference.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// An operation that would break a store invariant.
    #[error("{title}: {message}")]
    InvariantViolation { title: String, message: String },

    /// Live code failed to run. Rendered as terminal output.
    #[error("Error executing code: {0}")]
    Execution(String),
}

impl WorkspaceError {
    pub fn validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn invariant(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Short heading used for the toast title
    pub fn title(&self) -> String {
        match self {
            Self::Validation { title, .. } | Self::InvariantViolation { title, .. } => {
                title.clone()
            }
            Self::NotFound { what, .. } => format!("{} not found", capitalize(what)),
            Self::Execution(_) => "Execution failed".to_string(),
        }
    }

    /// Longer text used for the toast body
    pub fn description(&self) -> String {
        match self {
            Self::Validation { message, .. } | Self::InvariantViolation { message, .. } => {
                message.clone()
            }
            Self::NotFound { what, id } => format!("No {} with id {}", what, id),
            Self::Execution(message) => message.clone(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_title() {
        let err = WorkspaceError::not_found("node", "abc");
        assert_eq!(err.title(), "Node not found");
        assert_eq!(err.description(), "No node with id abc");
        assert_eq!(err.to_string(), "node not found: abc");
    }

    #[test]
    fn test_execution_display() {
        let err = WorkspaceError::Execution("x is not defined".into());
        assert_eq!(err.to_string(), "Error executing code: x is not defined");
    }
}
