use super::snippets::ContentSource;
use crate::error::{Result, WorkspaceError};
use crate::file_tree::{FileSystemNode, NodeId};
use crate::language;

pub const WELCOME_ID: &str = "welcome";
pub const EMPTY_FILE_PLACEHOLDER: &str = "// Empty file";

const WELCOME_TEXT: &str = "# Welcome to NebulaCode Studio

Select a file from the explorer to start editing, or create a new file.

## Features

- Multi-language syntax highlighting
- File explorer
- Terminal
- Settings panel
- Command palette
- Code editing and execution

*Launch your logic into the stars* ✨";

/// An open editor buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    /// Originating file id, or a synthetic id for unsaved buffers
    pub id: String,
    pub title: String,
    pub language: String,
    pub content: String,
    /// Edited since the last save
    pub modified: bool,
}

impl Tab {
    fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            language: language.into(),
            content: content.into(),
            modified: false,
        }
    }

    pub fn welcome() -> Self {
        Self::new(WELCOME_ID, "welcome.md", "markdown", WELCOME_TEXT)
    }
}

/// The ordered set of open tabs plus the active selection.
///
/// Never empty. Tab ids are unique and order is insertion order.
#[derive(Debug, Clone)]
pub struct TabSet {
    tabs: Vec<Tab>,
    active: usize,
    next_scratch: usize,
}

impl TabSet {
    /// A set holding only the welcome tab
    pub fn new() -> Self {
        Self {
            tabs: vec![Tab::welcome()],
            active: 0,
            next_scratch: 1,
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active(&self) -> &Tab {
        &self.tabs[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_id(&self) -> &str {
        &self.active().id
    }

    pub fn get(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    /// Open a file, or activate its tab if it is already open
    pub fn open(&mut self, file: &FileSystemNode, source: &dyn ContentSource) {
        if let Some(index) = self.index_of(file.id.as_str()) {
            self.active = index;
            return;
        }

        let language = file
            .language
            .clone()
            .or_else(|| language::extension(&file.name))
            .unwrap_or_else(|| "plaintext".to_string());
        let content = source
            .content_for(&file.name)
            .unwrap_or(EMPTY_FILE_PLACEHOLDER);

        log::debug!("Opening tab {} ({})", file.name, language);
        self.push(Tab::new(file.id.as_str(), file.name.as_str(), language, content));
    }

    /// Open a fresh unsaved buffer and return its id
    pub fn open_scratch(&mut self, language: &str) -> String {
        let mut n = self.next_scratch;
        while self.contains(&format!("untitled-{}", n)) {
            n += 1;
        }
        self.next_scratch = n + 1;

        let id = format!("untitled-{}", n);
        let title = format!("{}.{}", id, language::default_extension(language));
        self.push(Tab::new(id.clone(), title, language, ""));
        id
    }

    fn push(&mut self, tab: Tab) {
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
    }

    /// Close a tab. The last remaining tab cannot be closed.
    pub fn close(&mut self, id: &str) -> Result<Tab> {
        let index = self
            .index_of(id)
            .ok_or_else(|| WorkspaceError::not_found("tab", id))?;

        if self.tabs.len() == 1 {
            return Err(WorkspaceError::invariant(
                "Cannot close tab",
                "At least one tab must remain open",
            ));
        }

        let tab = self.tabs.remove(index);
        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        Ok(tab)
    }

    /// Replace the content of a tab
    pub fn edit(&mut self, id: &str, content: impl Into<String>) -> Result<()> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| WorkspaceError::not_found("tab", id))?;
        tab.content = content.into();
        tab.modified = true;
        Ok(())
    }

    pub fn activate(&mut self, id: &str) -> Result<()> {
        self.active = self
            .index_of(id)
            .ok_or_else(|| WorkspaceError::not_found("tab", id))?;
        Ok(())
    }

    /// Activate the next tab, wrapping around
    pub fn activate_next(&mut self) {
        self.active = (self.active + 1) % self.tabs.len();
    }

    /// Activate the previous tab, wrapping around
    pub fn activate_prev(&mut self) {
        self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
    }

    /// Clear the modified flag on the active tab
    pub fn mark_saved(&mut self) {
        self.tabs[self.active].modified = false;
    }

    pub fn mark_all_saved(&mut self) {
        for tab in &mut self.tabs {
            tab.modified = false;
        }
    }

    /// Follow a file rename. Returns whether a tab was open for it.
    pub fn rename_file(&mut self, id: &NodeId, title: &str) -> bool {
        match self.tabs.iter_mut().find(|t| t.id == id.as_str()) {
            Some(tab) => {
                tab.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop the tabs of deleted files.
    ///
    /// If no tab would remain, the welcome tab is reopened first. Returns the
    /// number of tabs closed.
    pub fn close_all_for(&mut self, ids: &[NodeId]) -> usize {
        let doomed = |tab: &Tab| ids.iter().any(|id| id.as_str() == tab.id);
        let closing = self.tabs.iter().filter(|t| doomed(t)).count();
        if closing == 0 {
            return 0;
        }

        if closing == self.tabs.len() {
            self.tabs.push(Tab::welcome());
        }

        let active_id = self.active().id.clone();
        self.tabs.retain(|t| !doomed(t));
        self.active = self.index_of(&active_id).unwrap_or(0);
        closing
    }
}

impl Default for TabSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SnippetLibrary;
    use crate::file_tree::{FileTreeStore, NodeKind};

    fn file(store: &FileTreeStore, id: &str) -> FileSystemNode {
        store.find(&NodeId::from(id)).unwrap().clone()
    }

    #[test]
    fn test_starts_with_welcome() {
        let tabs = TabSet::new();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active().id, "welcome");
        assert_eq!(tabs.active().title, "welcome.md");
        assert!(tabs.active().content.starts_with("# Welcome to NebulaCode Studio"));
    }

    #[test]
    fn test_open_seeds_content_and_language() {
        let store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "2"), &SnippetLibrary);

        assert_eq!(tabs.len(), 2);
        let tab = tabs.active();
        assert_eq!(tab.id, "2");
        assert_eq!(tab.title, "index.js");
        assert_eq!(tab.language, "javascript");
        assert!(tab.content.contains("Main application entry point"));
        assert!(!tab.modified);
    }

    #[test]
    fn test_open_twice_does_not_duplicate() {
        let store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "3"), &SnippetLibrary);
        tabs.activate("welcome").unwrap();

        tabs.open(&file(&store, "3"), &SnippetLibrary);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.tabs().iter().filter(|t| t.id == "3").count(), 1);
        assert_eq!(tabs.active_id(), "3");
    }

    #[test]
    fn test_open_unknown_file_uses_placeholder() {
        let mut store = FileTreeStore::seeded();
        let id = store.create(None, "main.rs", NodeKind::File).unwrap();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, id.as_str()), &SnippetLibrary);
        assert_eq!(tabs.active().content, EMPTY_FILE_PLACEHOLDER);
        assert_eq!(tabs.active().language, "rs");
    }

    #[test]
    fn test_close_only_tab_fails() {
        let mut tabs = TabSet::new();
        let err = tabs.close("welcome").unwrap_err();
        assert!(matches!(err, WorkspaceError::InvariantViolation { .. }));
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn test_close_missing_tab() {
        let mut tabs = TabSet::new();
        tabs.open_scratch("javascript");
        assert!(matches!(
            tabs.close("nope"),
            Err(WorkspaceError::NotFound { .. })
        ));
        assert_eq!(tabs.len(), 2);
    }

    #[test]
    fn test_close_active_activates_first() {
        let store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "2"), &SnippetLibrary);
        tabs.open(&file(&store, "3"), &SnippetLibrary);
        assert_eq!(tabs.active_id(), "3");

        tabs.close("3").unwrap();
        assert_eq!(tabs.active_id(), "welcome");
    }

    #[test]
    fn test_close_before_active_keeps_selection() {
        let store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "2"), &SnippetLibrary);
        tabs.open(&file(&store, "3"), &SnippetLibrary);

        tabs.close("2").unwrap();
        assert_eq!(tabs.active_id(), "3");
    }

    #[test]
    fn test_edit_replaces_content() {
        let mut tabs = TabSet::new();
        let id = tabs.open_scratch("javascript");
        tabs.edit(&id, "console.log(1)").unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "console.log(1)");
        assert!(tabs.get(&id).unwrap().modified);
        assert!(tabs.edit("missing", "x").is_err());

        tabs.mark_saved();
        assert!(!tabs.active().modified);
    }

    #[test]
    fn test_scratch_ids_are_unique() {
        let mut tabs = TabSet::new();
        let a = tabs.open_scratch("javascript");
        let b = tabs.open_scratch("python");
        assert_eq!(a, "untitled-1");
        assert_eq!(b, "untitled-2");
        assert_eq!(tabs.get(&a).unwrap().title, "untitled-1.js");
        assert_eq!(tabs.get(&b).unwrap().title, "untitled-2.py");
        assert_eq!(tabs.get(&b).unwrap().language, "python");
    }

    #[test]
    fn test_rename_file_updates_title() {
        let store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "2"), &SnippetLibrary);
        assert!(tabs.rename_file(&NodeId::from("2"), "main.js"));
        assert_eq!(tabs.get("2").unwrap().title, "main.js");
        assert!(!tabs.rename_file(&NodeId::from("9"), "x.md"));
    }

    #[test]
    fn test_close_all_for_deleted_files() {
        let mut store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "5"), &SnippetLibrary);
        tabs.open(&file(&store, "6"), &SnippetLibrary);
        tabs.open(&file(&store, "2"), &SnippetLibrary);

        let removed = store.delete(&NodeId::from("4")).unwrap();
        assert_eq!(tabs.close_all_for(&removed), 2);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs.active_id(), "2");
    }

    #[test]
    fn test_close_all_for_keeps_one_tab() {
        let mut store = FileTreeStore::seeded();
        let mut tabs = TabSet::new();
        tabs.open(&file(&store, "2"), &SnippetLibrary);
        tabs.close("welcome").unwrap();

        let removed = store.delete(&NodeId::from("1")).unwrap();
        assert_eq!(tabs.close_all_for(&removed), 1);
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active_id(), "welcome");
    }

    #[test]
    fn test_cycle_tabs() {
        let mut tabs = TabSet::new();
        tabs.open_scratch("javascript");
        tabs.activate_next();
        assert_eq!(tabs.active_id(), "welcome");
        tabs.activate_prev();
        assert_eq!(tabs.active_id(), "untitled-1");
    }
}
