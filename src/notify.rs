//! Short-lived toast notifications.

use crate::error::WorkspaceError;
use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

/// Oldest toasts are dropped past this many
const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Normal,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub description: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct Notifier {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        duration: Duration,
    ) -> u64 {
        self.push_kind(ToastKind::Normal, title.into(), description.into(), duration)
    }

    /// Report a recoverable error
    pub fn error(&mut self, err: &WorkspaceError) -> u64 {
        log::warn!("{}", err);
        self.push_kind(
            ToastKind::Error,
            err.title(),
            err.description(),
            DEFAULT_DURATION,
        )
    }

    /// Report a failure that has no domain error, e.g. clipboard access
    pub fn failure(&mut self, title: impl Into<String>, description: impl Into<String>) -> u64 {
        let (title, description) = (title.into(), description.into());
        log::warn!("{}: {}", title, description);
        self.push_kind(ToastKind::Error, title, description, DEFAULT_DURATION)
    }

    fn push_kind(
        &mut self,
        kind: ToastKind,
        title: String,
        description: String,
        duration: Duration,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            title,
            description,
            expires_at: Instant::now() + duration,
        });
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|toast| toast.id != id);
    }

    /// Drop expired toasts; true when anything changed
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.expires_at > now);
        self.toasts.len() != before
    }

    /// Oldest first
    pub fn visible(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_expire() {
        let mut notifier = Notifier::new();
        notifier.push("File saved", "index.js has been saved", Duration::from_millis(100));
        notifier.push("Later", "stays", Duration::from_secs(60));
        assert_eq!(notifier.visible().len(), 2);

        assert!(!notifier.expire(Instant::now()));
        assert!(notifier.expire(Instant::now() + Duration::from_secs(1)));
        assert_eq!(notifier.visible().len(), 1);
        assert_eq!(notifier.visible()[0].title, "Later");

        assert!(notifier.expire(Instant::now() + Duration::from_secs(120)));
        assert!(notifier.is_empty());
    }

    #[test]
    fn test_error_toast() {
        let mut notifier = Notifier::new();
        let err = WorkspaceError::invariant("Cannot close tab", "At least one tab must remain open");
        notifier.error(&err);

        let toast = &notifier.visible()[0];
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Cannot close tab");
        assert_eq!(toast.description, "At least one tab must remain open");

        notifier.failure("Copy failed", "Clipboard not available");
        assert_eq!(notifier.visible()[1].kind, ToastKind::Error);
    }

    #[test]
    fn test_visible_is_bounded() {
        let mut notifier = Notifier::new();
        let ids: Vec<_> = (0..6)
            .map(|i| notifier.push(format!("t{}", i), "", DEFAULT_DURATION))
            .collect();
        assert_eq!(notifier.visible().len(), MAX_VISIBLE);
        assert_eq!(notifier.visible()[0].title, "t2");

        notifier.dismiss(ids[5]);
        assert_eq!(notifier.visible().last().unwrap().title, "t4");
    }
}
