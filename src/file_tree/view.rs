use super::node::{NodeId, NodeKind};
use super::store::FileTreeStore;
use std::collections::HashSet;

/// A visible row of the tree (flattened for display)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Depth level in the tree (0 = top level)
    pub depth: usize,
    /// Whether this folder is expanded (folders only)
    pub expanded: bool,
}

impl TreeRow {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Transient view state over the file tree store
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    /// Folders currently expanded
    expanded: HashSet<NodeId>,
    /// All visible rows (flattened for display)
    pub rows: Vec<TreeRow>,
    /// Currently selected row index
    pub selected: usize,
    /// Scroll offset for display
    pub scroll_offset: usize,
    /// Node marked for a pending move
    pub marked: Option<NodeId>,
}

impl TreeView {
    /// Create a view with the given folders expanded
    pub fn new(store: &FileTreeStore, expanded: impl IntoIterator<Item = NodeId>) -> Self {
        let mut view = Self {
            expanded: expanded.into_iter().collect(),
            ..Self::default()
        };
        view.refresh(store);
        view
    }

    /// Rebuild the visible rows from the store
    pub fn refresh(&mut self, store: &FileTreeStore) {
        let selected_id = self.selected_id().cloned();

        self.expanded.retain(|id| store.contains(id));
        if self.marked.as_ref().is_some_and(|id| !store.contains(id)) {
            self.marked = None;
        }

        self.rows.clear();
        self.flatten(store, None, 0);

        // Keep the same node selected if it is still visible
        if let Some(id) = selected_id {
            if let Some(index) = self.index_of(&id) {
                self.selected = index;
            }
        }
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    fn flatten(&mut self, store: &FileTreeStore, parent: Option<&NodeId>, depth: usize) {
        for id in store.children(parent) {
            let Some(node) = store.find(id) else {
                continue;
            };
            let expanded = node.is_folder() && self.expanded.contains(id);
            self.rows.push(TreeRow {
                id: id.clone(),
                name: node.name.clone(),
                kind: node.kind,
                depth,
                expanded,
            });
            if expanded {
                self.flatten(store, Some(id), depth + 1);
            }
        }
    }

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    /// Mark a folder expanded
    pub fn expand(&mut self, store: &FileTreeStore, id: &NodeId) {
        if store.find(id).is_some_and(|n| n.is_folder()) {
            self.expanded.insert(id.clone());
            self.refresh(store);
        }
    }

    /// Toggle expand/collapse of a folder
    pub fn toggle(&mut self, store: &FileTreeStore, id: &NodeId) {
        if !self.expanded.remove(id) {
            self.expand(store, id);
        } else {
            self.refresh(store);
        }
    }

    /// Drop references to nodes that no longer exist
    pub fn forget(&mut self, store: &FileTreeStore, removed: &[NodeId]) {
        for id in removed {
            self.expanded.remove(id);
        }
        self.refresh(store);
    }

    /// Get the currently selected row
    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.selected)
    }

    pub fn selected_id(&self) -> Option<&NodeId> {
        self.selected_row().map(|r| &r.id)
    }

    /// Select a node by id, if it is visible
    pub fn select(&mut self, id: &NodeId) {
        if let Some(index) = self.index_of(id) {
            self.selected = index;
        }
    }

    fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.rows.iter().position(|r| &r.id == id)
    }

    /// Folder that a "new file" action in the current selection targets.
    ///
    /// A selected folder is the target; a selected file targets its parent.
    pub fn target_folder(&self, store: &FileTreeStore) -> Option<NodeId> {
        let row = self.selected_row()?;
        if row.is_folder() {
            Some(row.id.clone())
        } else {
            store.parent(&row.id).cloned()
        }
    }

    /// Move selection up
    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.ensure_visible();
        }
    }

    /// Move selection down
    pub fn move_down(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
            self.ensure_visible();
        }
    }

    fn ensure_visible(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        }
    }

    /// Adjust scroll to ensure selected row is visible given viewport height
    pub fn ensure_visible_with_height(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }

        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
        self.ensure_visible();
    }

    pub fn page_down(&mut self, page_size: usize) {
        self.selected = (self.selected + page_size).min(self.rows.len().saturating_sub(1));
        self.ensure_visible();
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
        self.ensure_visible();
    }

    /// Get the row index at a given visual row (accounting for scroll)
    pub fn index_at_row(&self, row: usize) -> Option<usize> {
        let index = self.scroll_offset + row;
        (index < self.rows.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn seeded_view() -> (FileTreeStore, TreeView) {
        let store = FileTreeStore::seeded();
        let view = TreeView::new(&store, [id("1"), id("4")]);
        (store, view)
    }

    #[test]
    fn test_initial_rows() {
        let (_, view) = seeded_view();
        let names: Vec<&str> = view.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "src",
                "index.js",
                "styles.css",
                "components",
                "Button.jsx",
                "Card.jsx",
                "public",
                "README.md",
                "package.json"
            ]
        );
        assert_eq!(view.rows[4].depth, 2);
    }

    #[test]
    fn test_toggle_collapses_and_expands() {
        let (store, mut view) = seeded_view();
        view.toggle(&store, &id("1"));
        assert_eq!(view.rows.len(), 4);
        view.toggle(&store, &id("7"));
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[2].name, "index.html");
    }

    #[test]
    fn test_delete_invalidates_selection_and_expansion() {
        let (mut store, mut view) = seeded_view();
        view.select(&id("5"));
        assert_eq!(view.selected_id(), Some(&id("5")));

        let removed = store.delete(&id("4")).unwrap();
        view.forget(&store, &removed);

        assert!(!view.is_expanded(&id("4")));
        assert!(view.rows.iter().all(|r| store.contains(&r.id)));
        assert!(view.selected < view.rows.len());
    }

    #[test]
    fn test_marked_node_cleared_on_delete() {
        let (mut store, mut view) = seeded_view();
        view.marked = Some(id("3"));
        let removed = store.delete(&id("3")).unwrap();
        view.forget(&store, &removed);
        assert!(view.marked.is_none());
    }

    #[test]
    fn test_target_folder() {
        let (store, mut view) = seeded_view();
        view.select(&id("2"));
        assert_eq!(view.target_folder(&store), Some(id("1")));
        view.select(&id("4"));
        assert_eq!(view.target_folder(&store), Some(id("4")));
        view.select(&id("9"));
        assert_eq!(view.target_folder(&store), None);
    }

    #[test]
    fn test_navigation_bounds() {
        let (_, mut view) = seeded_view();
        view.move_up();
        assert_eq!(view.selected, 0);
        view.go_to_bottom();
        assert_eq!(view.selected, view.rows.len() - 1);
        view.move_down();
        assert_eq!(view.selected, view.rows.len() - 1);
        view.page_up(100);
        assert_eq!(view.selected, 0);
        view.ensure_visible_with_height(3);
        assert_eq!(view.index_at_row(2), Some(2));
        assert_eq!(view.index_at_row(50), None);
    }
}
