use super::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Maps keyboard events to application events
pub fn map_key_event(key: KeyEvent) -> Option<AppEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        // Quit: Ctrl+Q
        KeyCode::Char('q') if ctrl && !shift => Some(AppEvent::Quit),

        // Theme. Terminals report Ctrl+Shift+letter as either case.
        KeyCode::Char('d') | KeyCode::Char('D') if ctrl && shift => Some(AppEvent::DarkMode),
        KeyCode::Char('l') | KeyCode::Char('L') if ctrl && shift => Some(AppEvent::LightMode),
        KeyCode::Char('c') | KeyCode::Char('C') if ctrl && shift => Some(AppEvent::CopyTerminal),

        KeyCode::Char('n') | KeyCode::Char('N') if ctrl && shift => Some(AppEvent::NewScratch),

        // Editor toolbar
        KeyCode::Char('n') if ctrl => Some(AppEvent::NewFile),
        KeyCode::Char('s') if ctrl => Some(AppEvent::Save),
        KeyCode::F(5) => Some(AppEvent::Run),
        KeyCode::Char('r') if ctrl => Some(AppEvent::Run),
        KeyCode::Char('y') if ctrl => Some(AppEvent::CopyCode),
        KeyCode::Char('d') if ctrl => Some(AppEvent::Download),
        KeyCode::Char('f') if alt && shift => Some(AppEvent::Format),
        KeyCode::Char('F') if alt => Some(AppEvent::Format),
        KeyCode::Char('w') if ctrl => Some(AppEvent::CloseTab),

        // Panels
        KeyCode::Char('p') | KeyCode::Char('k') if ctrl => Some(AppEvent::OpenPalette),
        KeyCode::Char(',') if ctrl => Some(AppEvent::OpenSettings),
        KeyCode::F(10) => Some(AppEvent::OpenSettings),
        // Ctrl+` arrives as Ctrl+Space on most terminals
        KeyCode::Char('`') | KeyCode::Char(' ') if ctrl => Some(AppEvent::ToggleTerminal),
        KeyCode::Char('t') if ctrl => Some(AppEvent::ToggleTerminal),
        KeyCode::Char('b') if ctrl => Some(AppEvent::ToggleSidebar),

        // Navigation
        KeyCode::PageDown if ctrl => Some(AppEvent::NextTab),
        KeyCode::PageUp if ctrl => Some(AppEvent::PreviousTab),

        // Focus switching
        KeyCode::F(2) => Some(AppEvent::FocusEditor),
        KeyCode::F(3) => Some(AppEvent::FocusFileTree),
        KeyCode::F(4) => Some(AppEvent::FocusTerminal),
        KeyCode::BackTab => Some(AppEvent::CycleFocusBackward),
        KeyCode::Tab if alt => Some(AppEvent::CycleFocusForward),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_palette_shortcuts() {
        assert_eq!(
            map_key_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL)),
            Some(AppEvent::Save)
        );
        assert_eq!(
            map_key_event(key(KeyCode::Char('n'), KeyModifiers::CONTROL)),
            Some(AppEvent::NewFile)
        );
        assert_eq!(
            map_key_event(key(KeyCode::Char(','), KeyModifiers::CONTROL)),
            Some(AppEvent::OpenSettings)
        );
        assert_eq!(map_key_event(key(KeyCode::F(5), KeyModifiers::NONE)), Some(AppEvent::Run));
    }

    #[test]
    fn test_ctrl_shift_either_case() {
        let ctrl_shift = KeyModifiers::CONTROL | KeyModifiers::SHIFT;
        assert_eq!(
            map_key_event(key(KeyCode::Char('D'), ctrl_shift)),
            Some(AppEvent::DarkMode)
        );
        assert_eq!(
            map_key_event(key(KeyCode::Char('l'), ctrl_shift)),
            Some(AppEvent::LightMode)
        );
        // Without shift, Ctrl+D downloads
        assert_eq!(
            map_key_event(key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(AppEvent::Download)
        );
    }

    #[test]
    fn test_plain_keys_fall_through() {
        assert_eq!(map_key_event(key(KeyCode::Char('a'), KeyModifiers::NONE)), None);
        assert_eq!(map_key_event(key(KeyCode::Tab, KeyModifiers::NONE)), None);
        assert_eq!(map_key_event(key(KeyCode::Enter, KeyModifiers::NONE)), None);
    }
}
