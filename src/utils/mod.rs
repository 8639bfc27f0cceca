pub mod clipboard;
pub mod download;

pub use clipboard::Clipboard;
