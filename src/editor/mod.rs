mod buffer;
mod cursor;
mod format;
mod snippets;
mod state;
mod tabs;

pub use snippets::SnippetLibrary;
pub use state::{EditorState, Motion};
pub use tabs::TabSet;
