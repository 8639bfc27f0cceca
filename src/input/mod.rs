//! Translation of raw crossterm input into application events.

pub mod event;
pub mod keyboard;
pub mod mouse;

pub use event::AppEvent;
pub use keyboard::map_key_event;
pub use mouse::{map_mouse_event, MouseAction};
