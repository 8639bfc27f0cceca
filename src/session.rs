//! Session-wide UI state: which panels are open, the theme mode, the focused
//! pane and the active modal dialog.
//!
//! The stores never look at this; the app and the views pass it around.

use crate::file_tree::{NodeId, NodeKind};

/// Light or dark color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// Parse a config value; anything but "light" is dark
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("light") {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

/// Which pane receives keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    Tree,
    #[default]
    Editor,
    Terminal,
}

/// Modal prompts over the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Name prompt for a new node under `parent` (`None` for the top level)
    NewNode {
        parent: Option<NodeId>,
        kind: NodeKind,
        input: String,
    },
    Rename {
        id: NodeId,
        input: String,
    },
    ConfirmDelete {
        id: NodeId,
    },
}

impl Dialog {
    /// Text field of the dialog, if it has one
    pub fn input_mut(&mut self) -> Option<&mut String> {
        match self {
            Dialog::NewNode { input, .. } | Dialog::Rename { input, .. } => Some(input),
            Dialog::ConfirmDelete { .. } => None,
        }
    }
}

/// Rows of the settings panel, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Theme,
    DefaultLanguage,
    AutoSave,
    TabWidth,
    LineNumbers,
    Starfield,
}

impl SettingsField {
    pub const ALL: [SettingsField; 6] = [
        SettingsField::Theme,
        SettingsField::DefaultLanguage,
        SettingsField::AutoSave,
        SettingsField::TabWidth,
        SettingsField::LineNumbers,
        SettingsField::Starfield,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Theme => "Theme",
            SettingsField::DefaultLanguage => "Default language",
            SettingsField::AutoSave => "Auto save",
            SettingsField::TabWidth => "Tab width",
            SettingsField::LineNumbers => "Line numbers",
            SettingsField::Starfield => "Starfield",
        }
    }
}

/// Explicit session context
#[derive(Debug, Clone)]
pub struct Session {
    pub terminal_open: bool,
    pub palette_open: bool,
    pub settings_open: bool,
    pub sidebar_open: bool,
    pub theme: ThemeMode,
    pub focus: Pane,
    pub dialog: Option<Dialog>,
    /// Highlighted row of the settings panel
    pub settings_selected: usize,
}

impl Session {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            terminal_open: false,
            palette_open: false,
            settings_open: false,
            sidebar_open: true,
            theme,
            focus: Pane::Editor,
            dialog: None,
            settings_selected: 0,
        }
    }

    /// Whether an overlay currently swallows input
    pub fn has_overlay(&self) -> bool {
        self.dialog.is_some() || self.palette_open || self.settings_open
    }

    /// Show or hide the terminal, moving focus with it
    pub fn toggle_terminal(&mut self) {
        self.terminal_open = !self.terminal_open;
        if self.terminal_open {
            self.focus = Pane::Terminal;
        } else if self.focus == Pane::Terminal {
            self.focus = Pane::Editor;
        }
    }

    pub fn open_terminal(&mut self) {
        self.terminal_open = true;
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
        if !self.sidebar_open && self.focus == Pane::Tree {
            self.focus = Pane::Editor;
        }
    }

    /// Open the palette, closing the settings panel
    pub fn open_palette(&mut self) {
        self.settings_open = false;
        self.palette_open = true;
    }

    /// Open the settings panel, closing the palette
    pub fn open_settings(&mut self) {
        self.palette_open = false;
        self.settings_open = true;
        self.settings_selected = 0;
    }

    /// Close the palette and the settings panel. An open dialog stays.
    pub fn close_panels(&mut self) {
        self.palette_open = false;
        self.settings_open = false;
    }

    pub fn settings_field(&self) -> SettingsField {
        SettingsField::ALL[self.settings_selected.min(SettingsField::ALL.len() - 1)]
    }

    pub fn settings_next(&mut self) {
        if self.settings_selected + 1 < SettingsField::ALL.len() {
            self.settings_selected += 1;
        }
    }

    pub fn settings_prev(&mut self) {
        self.settings_selected = self.settings_selected.saturating_sub(1);
    }

    /// Cycle focus through the visible panes
    pub fn cycle_focus(&mut self, forward: bool) {
        let mut panes = Vec::with_capacity(3);
        if self.sidebar_open {
            panes.push(Pane::Tree);
        }
        panes.push(Pane::Editor);
        if self.terminal_open {
            panes.push(Pane::Terminal);
        }

        let current = panes.iter().position(|p| *p == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % panes.len()
        } else {
            (current + panes.len() - 1) % panes.len()
        };
        self.focus = panes[next];
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ThemeMode::Dark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode() {
        assert_eq!(ThemeMode::from_name("light"), ThemeMode::Light);
        assert_eq!(ThemeMode::from_name("LIGHT"), ThemeMode::Light);
        assert_eq!(ThemeMode::from_name("solarized"), ThemeMode::Dark);
        assert_eq!(ThemeMode::Dark.toggled().name(), "light");
    }

    #[test]
    fn test_terminal_toggle_moves_focus() {
        let mut session = Session::default();
        assert!(!session.terminal_open);

        session.toggle_terminal();
        assert!(session.terminal_open);
        assert_eq!(session.focus, Pane::Terminal);

        session.toggle_terminal();
        assert!(!session.terminal_open);
        assert_eq!(session.focus, Pane::Editor);
    }

    #[test]
    fn test_overlays_are_exclusive() {
        let mut session = Session::default();
        session.open_palette();
        assert!(session.palette_open);
        assert!(session.has_overlay());

        session.open_settings();
        assert!(!session.palette_open);
        assert!(session.settings_open);

        session.dialog = Some(Dialog::ConfirmDelete { id: NodeId::from("2") });
        session.close_panels();
        assert!(!session.settings_open);
        assert!(session.has_overlay());

        session.dialog = None;
        assert!(!session.has_overlay());
    }

    #[test]
    fn test_cycle_focus_skips_hidden_panes() {
        let mut session = Session::default();
        session.cycle_focus(true);
        assert_eq!(session.focus, Pane::Tree);
        session.cycle_focus(true);
        assert_eq!(session.focus, Pane::Editor);

        session.open_terminal();
        session.cycle_focus(true);
        assert_eq!(session.focus, Pane::Terminal);

        session.toggle_sidebar();
        session.cycle_focus(true);
        assert_eq!(session.focus, Pane::Editor);
        session.cycle_focus(false);
        assert_eq!(session.focus, Pane::Terminal);
    }

    #[test]
    fn test_settings_selection_is_clamped() {
        let mut session = Session::default();
        session.open_settings();
        session.settings_prev();
        assert_eq!(session.settings_field(), SettingsField::Theme);
        for _ in 0..10 {
            session.settings_next();
        }
        assert_eq!(session.settings_field(), SettingsField::Starfield);
    }

    #[test]
    fn test_dialog_input() {
        let mut dialog = Dialog::NewNode {
            parent: None,
            kind: NodeKind::File,
            input: String::new(),
        };
        if let Some(input) = dialog.input_mut() {
            input.push_str("app.js");
        }
        assert!(matches!(&dialog, Dialog::NewNode { input, .. } if input == "app.js"));
        assert!(Dialog::ConfirmDelete { id: NodeId::from("1") }.input_mut().is_none());
    }
}
