//! Command palette catalog and its search state.

/// What a palette entry does when chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Settings,
    NewFile,
    Save,
    Terminal,
    Run,
    DarkMode,
    LightMode,
}

impl CommandAction {
    pub const ALL: [CommandAction; 7] = [
        CommandAction::Settings,
        CommandAction::NewFile,
        CommandAction::Save,
        CommandAction::Terminal,
        CommandAction::Run,
        CommandAction::DarkMode,
        CommandAction::LightMode,
    ];

    /// Stable string tag, e.g. `"new-file"`
    pub fn tag(self) -> &'static str {
        match self {
            CommandAction::Settings => "settings",
            CommandAction::NewFile => "new-file",
            CommandAction::Save => "save",
            CommandAction::Terminal => "terminal",
            CommandAction::Run => "run",
            CommandAction::DarkMode => "dark-mode",
            CommandAction::LightMode => "light-mode",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.tag() == tag)
    }
}

/// A single palette entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: u8,
    pub title: &'static str,
    pub action: CommandAction,
    pub shortcut: &'static str,
}

/// The full catalog, in display order.
pub const COMMANDS: &[Command] = &[
    Command {
        id: 1,
        title: "Open Settings",
        action: CommandAction::Settings,
        shortcut: "Ctrl+,",
    },
    Command {
        id: 2,
        title: "New File",
        action: CommandAction::NewFile,
        shortcut: "Ctrl+N",
    },
    Command {
        id: 3,
        title: "Save File",
        action: CommandAction::Save,
        shortcut: "Ctrl+S",
    },
    Command {
        id: 4,
        title: "Toggle Terminal",
        action: CommandAction::Terminal,
        shortcut: "Ctrl+`",
    },
    Command {
        id: 5,
        title: "Run Code",
        action: CommandAction::Run,
        shortcut: "F5",
    },
    Command {
        id: 6,
        title: "Toggle Dark Mode",
        action: CommandAction::DarkMode,
        shortcut: "Ctrl+Shift+D",
    },
    Command {
        id: 7,
        title: "Toggle Light Mode",
        action: CommandAction::LightMode,
        shortcut: "Ctrl+Shift+L",
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRegistry;

impl CommandRegistry {
    pub fn all(&self) -> &'static [Command] {
        COMMANDS
    }

    /// Case-insensitive substring match on the title, catalog order kept
    pub fn search(&self, query: &str) -> Vec<&'static Command> {
        let needle = query.trim().to_lowercase();
        self.all()
            .iter()
            .filter(|command| needle.is_empty() || command.title.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Query and selection of the open palette
#[derive(Debug, Clone, Default)]
pub struct Palette {
    query: String,
    selected: usize,
}

impl Palette {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn results(&self) -> Vec<&'static Command> {
        CommandRegistry.search(&self.query)
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.selected = 0;
    }

    pub fn backspace(&mut self) {
        if self.query.pop().is_some() {
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        let count = self.results().len();
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Action under the selection, if any result matches
    pub fn chosen(&self) -> Option<CommandAction> {
        self.results().get(self.selected).map(|command| command.action)
    }

    pub fn reset(&mut self) {
        self.query.clear();
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let titles: Vec<_> = COMMANDS.iter().map(|c| c.title).collect();
        assert_eq!(
            titles,
            vec![
                "Open Settings",
                "New File",
                "Save File",
                "Toggle Terminal",
                "Run Code",
                "Toggle Dark Mode",
                "Toggle Light Mode",
            ]
        );
        let ids: Vec<_> = COMMANDS.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_tags() {
        for action in CommandAction::ALL {
            assert_eq!(CommandAction::from_tag(action.tag()), Some(action));
        }
        assert_eq!(CommandAction::from_tag("new-file"), Some(CommandAction::NewFile));
        assert_eq!(CommandAction::from_tag("New-File"), None);
        assert_eq!(CommandAction::from_tag("explode"), None);
    }

    #[test]
    fn test_search() {
        let registry = CommandRegistry;
        assert_eq!(registry.search("").len(), 7);

        let toggles: Vec<_> = registry.search("TOGGLE").iter().map(|c| c.id).collect();
        assert_eq!(toggles, vec![4, 6, 7]);

        let file: Vec<_> = registry.search("file").iter().map(|c| c.id).collect();
        assert_eq!(file, vec![2, 3]);

        assert!(registry.search("zzz").is_empty());
    }

    #[test]
    fn test_palette_selection() {
        let mut palette = Palette::default();
        assert_eq!(palette.chosen(), Some(CommandAction::Settings));

        palette.select_prev();
        assert_eq!(palette.selected(), 0);

        for _ in 0..20 {
            palette.select_next();
        }
        assert_eq!(palette.selected(), 6);
        assert_eq!(palette.chosen(), Some(CommandAction::LightMode));

        palette.push_char('r');
        assert_eq!(palette.selected(), 0);
        palette.push_char('u');
        palette.push_char('n');
        assert_eq!(palette.chosen(), Some(CommandAction::Run));

        palette.push_char('x');
        assert_eq!(palette.chosen(), None);
        palette.select_next();
        assert_eq!(palette.selected(), 0);

        palette.reset();
        assert_eq!(palette.query(), "");
    }
}
