//! Workspace tree: the node arena and the view state over it.

mod node;
mod store;
mod view;

pub use node::{FileSystemNode, NodeId, NodeKind};
pub use store::FileTreeStore;
pub use view::TreeView;
