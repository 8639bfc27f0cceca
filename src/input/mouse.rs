use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Represents a processed mouse action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MouseAction {
    /// Single click at position
    Click { x: u16, y: u16 },
    /// Middle click (closes a tab)
    MiddleClick { x: u16, y: u16 },
    /// Continue dragging to position
    Drag { x: u16, y: u16 },
    /// Stop dragging at position
    DragEnd { x: u16, y: u16 },
    /// Scroll up
    ScrollUp { x: u16, y: u16, amount: u16 },
    /// Scroll down
    ScrollDown { x: u16, y: u16, amount: u16 },
}

/// Maps a raw mouse event to a mouse action
pub fn map_mouse_event(event: MouseEvent) -> Option<MouseAction> {
    let x = event.column;
    let y = event.row;

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(MouseAction::Click { x, y }),
        MouseEventKind::Down(MouseButton::Middle) => Some(MouseAction::MiddleClick { x, y }),
        MouseEventKind::Up(MouseButton::Left) => Some(MouseAction::DragEnd { x, y }),
        MouseEventKind::Drag(MouseButton::Left) => Some(MouseAction::Drag { x, y }),
        MouseEventKind::ScrollUp => Some(MouseAction::ScrollUp { x, y, amount: 3 }),
        MouseEventKind::ScrollDown => Some(MouseAction::ScrollDown { x, y, amount: 3 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 4,
            row: 2,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_map_mouse_event() {
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left))),
            Some(MouseAction::Click { x: 4, y: 2 })
        );
        assert_eq!(
            map_mouse_event(mouse(MouseEventKind::ScrollDown)),
            Some(MouseAction::ScrollDown { x: 4, y: 2, amount: 3 })
        );
        assert_eq!(map_mouse_event(mouse(MouseEventKind::Moved)), None);
    }
}
