use super::node::{validate_name, FileSystemNode, NodeId, NodeKind};
use crate::error::{Result, WorkspaceError};
use crate::language;
use rand::Rng;
use std::collections::HashMap;

const ID_LEN: usize = 8;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Owns the workspace tree.
///
/// Nodes live in an id-indexed arena with parent back-references and ordered
/// child id lists, so lookups never need an ancestor path.
#[derive(Debug, Clone, Default)]
pub struct FileTreeStore {
    nodes: HashMap<NodeId, FileSystemNode>,
    roots: Vec<NodeId>,
}

impl FileTreeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the store with the sample project every session starts from
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let seed: &[(&str, Option<&str>, &str, NodeKind)] = &[
            ("1", None, "src", NodeKind::Folder),
            ("2", Some("1"), "index.js", NodeKind::File),
            ("3", Some("1"), "styles.css", NodeKind::File),
            ("4", Some("1"), "components", NodeKind::Folder),
            ("5", Some("4"), "Button.jsx", NodeKind::File),
            ("6", Some("4"), "Card.jsx", NodeKind::File),
            ("7", None, "public", NodeKind::Folder),
            ("8", Some("7"), "index.html", NodeKind::File),
            ("9", None, "README.md", NodeKind::File),
            ("10", None, "package.json", NodeKind::File),
        ];

        for (id, parent, name, kind) in seed {
            let parent = parent.map(NodeId::from);
            store.attach(NodeId::from(*id), parent, name, *kind);
        }
        store
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in display order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Look up a node by id
    pub fn find(&self, id: &NodeId) -> Option<&FileSystemNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Children of a folder, or the top level for `None`
    pub fn children(&self, parent: Option<&NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(id) => self
                .nodes
                .get(id)
                .and_then(|n| n.children.as_deref())
                .unwrap_or(&[]),
        }
    }

    /// Parent folder of a node
    pub fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id)?.parent.as_ref()
    }

    /// Slash-joined names from the top level down to the node
    pub fn path_of(&self, id: &NodeId) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = self.nodes.get(id)?;
        loop {
            parts.push(current.name.as_str());
            match &current.parent {
                Some(parent) => current = self.nodes.get(parent)?,
                None => break,
            }
        }
        parts.reverse();
        Some(parts.join("/"))
    }

    /// Create a file or folder under `parent` (`None` for the top level).
    ///
    /// The new node is appended after its siblings.
    pub fn create(&mut self, parent: Option<&NodeId>, name: &str, kind: NodeKind) -> Result<NodeId> {
        validate_name(name, kind)?;
        if let Some(parent_id) = parent {
            self.folder(parent_id)?;
        }

        let id = self.generate_id();
        self.attach(id.clone(), parent.cloned(), name, kind);
        log::debug!("created {:?} {} ({})", kind, name, id);
        Ok(id)
    }

    /// Rename a node. The language tag of a file is left as it was.
    pub fn rename(&mut self, id: &NodeId, new_name: &str) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| WorkspaceError::not_found("node", id.as_str()))?;
        validate_name(new_name, node.kind)?;

        log::debug!("renamed {} -> {} ({})", node.name, new_name, id);
        node.name = new_name.to_string();
        Ok(())
    }

    /// Remove a node and, for folders, every descendant.
    ///
    /// Returns the removed ids, the node itself first.
    pub fn delete(&mut self, id: &NodeId) -> Result<Vec<NodeId>> {
        let parent = self
            .nodes
            .get(id)
            .ok_or_else(|| WorkspaceError::not_found("node", id.as_str()))?
            .parent
            .clone();

        self.siblings_mut(parent.as_ref()).retain(|child| child != id);

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                if let Some(children) = node.children {
                    stack.extend(children.into_iter().rev());
                }
                removed.push(current);
            }
        }

        log::debug!("deleted {} ({} nodes)", id, removed.len());
        Ok(removed)
    }

    /// Move a node into another folder (`None` for the top level), appending it
    pub fn move_node(&mut self, id: &NodeId, new_parent: Option<&NodeId>) -> Result<()> {
        let old_parent = self
            .nodes
            .get(id)
            .ok_or_else(|| WorkspaceError::not_found("node", id.as_str()))?
            .parent
            .clone();

        if let Some(target) = new_parent {
            self.folder(target)?;
            if target == id || self.is_ancestor(id, target) {
                return Err(WorkspaceError::validation(
                    "Invalid move",
                    "A folder cannot be moved into itself",
                ));
            }
        }

        if old_parent.as_ref() == new_parent {
            return Ok(());
        }

        self.siblings_mut(old_parent.as_ref()).retain(|child| child != id);
        self.siblings_mut(new_parent).push(id.clone());
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = new_parent.cloned();
        }

        log::debug!("moved {} into {:?}", id, new_parent.map(NodeId::as_str));
        Ok(())
    }

    /// Whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn folder(&self, id: &NodeId) -> Result<&FileSystemNode> {
        self.nodes
            .get(id)
            .filter(|node| node.is_folder())
            .ok_or_else(|| WorkspaceError::not_found("folder", id.as_str()))
    }

    fn siblings_mut(&mut self, parent: Option<&NodeId>) -> &mut Vec<NodeId> {
        match parent {
            Some(id) => self
                .nodes
                .get_mut(id)
                .and_then(|n| n.children.as_mut())
                .unwrap_or(&mut self.roots),
            None => &mut self.roots,
        }
    }

    fn attach(&mut self, id: NodeId, parent: Option<NodeId>, name: &str, kind: NodeKind) {
        let node = FileSystemNode {
            id: id.clone(),
            name: name.to_string(),
            kind,
            language: (kind == NodeKind::File).then(|| language::language_for_name(name)),
            children: (kind == NodeKind::Folder).then(Vec::new),
            parent: parent.clone(),
        };
        self.siblings_mut(parent.as_ref()).push(id.clone());
        self.nodes.insert(id, node);
    }

    fn generate_id(&self) -> NodeId {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..ID_LEN)
                .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
                .collect();
            let id = NodeId::new(id);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }
}
