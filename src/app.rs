use crate::animation::{Starfield, Ticker, FRAME_INTERVAL};
use crate::commands::{CommandAction, Palette};
use crate::config::Config;
use crate::editor::{EditorState, Motion, SnippetLibrary, TabSet};
use crate::error::{Result as WorkspaceResult, WorkspaceError};
use crate::exec::{ExecutionSimulator, Limits};
use crate::file_tree::{FileTreeStore, NodeId, NodeKind, TreeView};
use crate::highlighting::HighlightingManager;
use crate::input::{map_key_event, map_mouse_event, AppEvent, MouseAction};
use crate::language::DEFAULT_LANGUAGE_CHOICES;
use crate::notify::{Notifier, DEFAULT_DURATION};
use crate::session::{Dialog, Pane, Session, SettingsField, ThemeMode};
use crate::terminal::Console;
use crate::theme::Theme;
use crate::ui::{self, Hit, LayoutAreas, ResizeTarget};
use crate::utils::{download, Clipboard};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use ratatui::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Folders expanded when the workspace is first shown
const INITIALLY_EXPANDED: [&str; 2] = ["1", "4"];

const MAX_TAB_WIDTH: usize = 8;

/// Main application state
pub struct App {
    /// Should the application quit?
    pub should_quit: bool,
    /// User preferences, saved whenever the settings change
    pub config: Config,
    /// Panels, focus, theme mode and the open dialog
    pub session: Session,
    /// Current color theme
    pub theme: Theme,
    pub store: FileTreeStore,
    pub tree: TreeView,
    pub tabs: TabSet,
    /// Cursor and scroll per tab
    pub editor: EditorState,
    snippets: SnippetLibrary,
    simulator: ExecutionSimulator,
    pub console: Console,
    pub palette: Palette,
    pub notifier: Notifier,
    /// Syntax highlighting manager
    pub highlighting: HighlightingManager,
    clipboard: Clipboard,
    pub starfield: Starfield,
    /// Redraw timer, running only while the starfield is shown
    ticker: Option<Ticker>,
    download_dir: PathBuf,
    /// Divider being dragged
    resizing: Option<ResizeTarget>,
    /// Areas drawn in the last frame, for mouse hit testing
    pub areas: LayoutAreas,
    /// Whether this app owns a real terminal: saves config and animates
    interactive: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let mut app = Self::build(config, Clipboard::new(), download::download_dir(), true);
        app.sync_ticker();
        app
    }

    /// An app without clipboard, timer or config writes
    #[cfg(test)]
    pub fn headless(config: Config, download_dir: PathBuf) -> Self {
        Self::build(config, Clipboard::unavailable(), download_dir, false)
    }

    fn build(config: Config, clipboard: Clipboard, download_dir: PathBuf, interactive: bool) -> Self {
        let store = FileTreeStore::seeded();
        let tree = TreeView::new(&store, INITIALLY_EXPANDED.map(NodeId::from));
        let mode = ThemeMode::from_name(&config.ui.theme);

        Self {
            should_quit: false,
            session: Session::new(mode),
            theme: Theme::for_mode(mode),
            store,
            tree,
            tabs: TabSet::new(),
            editor: EditorState::new(),
            snippets: SnippetLibrary::new(),
            simulator: ExecutionSimulator::new(Limits::from(&config.execution)),
            console: Console::new(config.terminal.history_limit),
            palette: Palette::default(),
            notifier: Notifier::new(),
            highlighting: HighlightingManager::new(),
            clipboard,
            starfield: Starfield::new(),
            ticker: None,
            download_dir,
            resizing: None,
            areas: LayoutAreas::default(),
            interactive,
            config,
        }
    }

    /// Main run loop
    pub fn run(&mut self, terminal: &mut ratatui::Terminal<impl Backend>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            // Handle events with a small timeout for responsiveness
            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            self.tick(Instant::now());
        }
        Ok(())
    }

    /// Advance the starfield and expire toasts
    fn tick(&mut self, now: Instant) {
        if let Some(ticker) = &self.ticker {
            for _ in 0..ticker.drain() {
                self.starfield.step();
            }
        }
        self.notifier.expire(now);
    }

    /// Start or stop the redraw timer to match the starfield setting
    fn sync_ticker(&mut self) {
        if !(self.interactive && self.config.ui.starfield) {
            self.ticker = None;
            return;
        }
        if self.ticker.is_none() {
            match Ticker::start(FRAME_INTERVAL) {
                Ok(ticker) => self.ticker = Some(ticker),
                Err(e) => log::warn!("Starfield timer failed to start: {}", e),
            }
        }
    }

    fn save_config(&self) {
        if !self.interactive {
            return;
        }
        if let Err(e) = self.config.save() {
            log::warn!("Failed to save config: {:#}", e);
        }
    }

    fn toast(&mut self, title: &str, description: impl Into<String>) {
        self.notifier.push(title, description, DEFAULT_DURATION);
    }

    /// Handle an input event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            _ => {}
        }
    }

    /// Handle keyboard events: dialog, then overlays, then globals, then the pane
    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.session.dialog.is_some() {
            return self.handle_dialog_key(key);
        }
        if self.session.palette_open {
            return self.handle_palette_key(key);
        }
        if self.session.settings_open {
            return self.handle_settings_key(key);
        }

        if let Some(event) = map_key_event(key) {
            return self.handle_app_event(event);
        }

        match self.session.focus {
            Pane::Tree => self.handle_tree_key(key),
            Pane::Editor => self.handle_editor_key(key),
            Pane::Terminal => self.handle_terminal_key(key),
        }
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.should_quit = true,
            AppEvent::FocusFileTree => {
                if !self.session.sidebar_open {
                    self.session.toggle_sidebar();
                }
                self.session.focus = Pane::Tree;
            }
            AppEvent::FocusEditor => self.session.focus = Pane::Editor,
            AppEvent::FocusTerminal => {
                self.session.open_terminal();
                self.session.focus = Pane::Terminal;
            }
            AppEvent::CycleFocusForward => self.session.cycle_focus(true),
            AppEvent::CycleFocusBackward => self.session.cycle_focus(false),
            AppEvent::ToggleSidebar => self.session.toggle_sidebar(),
            AppEvent::ToggleTerminal => self.session.toggle_terminal(),
            AppEvent::OpenPalette => {
                self.palette.reset();
                self.session.open_palette();
            }
            AppEvent::OpenSettings => self.session.open_settings(),
            AppEvent::DarkMode => self.set_theme(ThemeMode::Dark),
            AppEvent::LightMode => self.set_theme(ThemeMode::Light),
            AppEvent::NewFile => self.new_node_dialog(NodeKind::File),
            AppEvent::NewScratch => self.new_scratch(),
            AppEvent::Save => self.save(),
            AppEvent::SaveProject => self.save_project(),
            AppEvent::Run => self.run_active(),
            AppEvent::CopyCode => self.copy_code(),
            AppEvent::Download => self.download(),
            AppEvent::Format => self.format(),
            AppEvent::CloseTab => {
                let id = self.tabs.active_id().to_string();
                self.close_tab(&id);
            }
            AppEvent::CopyTerminal => self.copy_terminal(),
            AppEvent::ClearTerminal => self.console.clear(),
            AppEvent::NextTab => self.tabs.activate_next(),
            AppEvent::PreviousTab => self.tabs.activate_prev(),
        }
    }

    /// Run a palette command
    pub fn dispatch(&mut self, action: CommandAction) {
        log::debug!("Palette command: {}", action.tag());
        match action {
            CommandAction::Settings => self.session.open_settings(),
            CommandAction::NewFile => self.new_node_dialog(NodeKind::File),
            CommandAction::Save => self.save(),
            CommandAction::Terminal => self.session.toggle_terminal(),
            CommandAction::Run => self.run_active(),
            CommandAction::DarkMode => self.set_theme(ThemeMode::Dark),
            CommandAction::LightMode => self.set_theme(ThemeMode::Light),
        }
    }

    // ---- Theme and settings ----

    pub fn set_theme(&mut self, mode: ThemeMode) {
        self.session.theme = mode;
        self.theme = Theme::for_mode(mode);
        self.config.ui.theme = mode.name().to_string();
        self.save_config();

        let title = match mode {
            ThemeMode::Dark => "Dark theme activated",
            ThemeMode::Light => "Light theme activated",
        };
        self.toast(title, "Your visual preferences have been updated");
    }

    /// Step a settings value forward or back
    pub fn change_setting(&mut self, field: SettingsField, forward: bool) {
        let editor = &mut self.config.editor;
        match field {
            SettingsField::Theme => return self.set_theme(self.session.theme.toggled()),
            SettingsField::DefaultLanguage => {
                let count = DEFAULT_LANGUAGE_CHOICES.len();
                let current = DEFAULT_LANGUAGE_CHOICES
                    .iter()
                    .position(|l| *l == editor.default_language)
                    .unwrap_or(0);
                let next = if forward {
                    (current + 1) % count
                } else {
                    (current + count - 1) % count
                };
                editor.default_language = DEFAULT_LANGUAGE_CHOICES[next].to_string();
            }
            SettingsField::AutoSave => editor.auto_save = !editor.auto_save,
            SettingsField::TabWidth => {
                editor.tab_width = if forward {
                    (editor.tab_width + 1).min(MAX_TAB_WIDTH)
                } else {
                    editor.tab_width.saturating_sub(1).max(1)
                };
            }
            SettingsField::LineNumbers => editor.show_line_numbers = !editor.show_line_numbers,
            SettingsField::Starfield => {
                self.config.ui.starfield = !self.config.ui.starfield;
                self.sync_ticker();
            }
        }
        log::debug!("Setting changed: {}", field.label());
        self.save_config();
    }

    fn close_panels(&mut self) {
        self.session.close_panels();
        self.palette.reset();
    }

    fn handle_palette_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.close_panels(),
            KeyCode::Enter => {
                let chosen = self.palette.chosen();
                self.close_panels();
                if let Some(action) = chosen {
                    self.dispatch(action);
                }
            }
            KeyCode::Up => self.palette.select_prev(),
            KeyCode::Down => self.palette.select_next(),
            KeyCode::Backspace => self.palette.backspace(),
            KeyCode::Char(c) if !ctrl => self.palette.push_char(c),
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.close_panels(),
            KeyCode::Up | KeyCode::Char('k') => self.session.settings_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.session.settings_next(),
            KeyCode::Left | KeyCode::Char('h') => {
                self.change_setting(self.session.settings_field(), false)
            }
            KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') => {
                self.change_setting(self.session.settings_field(), true)
            }
            _ => {}
        }
    }

    // ---- Tree operations ----

    /// Prompt for a new node under the selected folder, or at the top level
    /// when the explorer is not focused
    pub fn new_node_dialog(&mut self, kind: NodeKind) {
        let parent = if self.session.focus == Pane::Tree {
            self.tree.target_folder(&self.store)
        } else {
            None
        };
        self.session.dialog = Some(Dialog::NewNode {
            parent,
            kind,
            input: String::new(),
        });
    }

    fn rename_dialog(&mut self) {
        if let Some(row) = self.tree.selected_row() {
            self.session.dialog = Some(Dialog::Rename {
                id: row.id.clone(),
                input: row.name.clone(),
            });
        }
    }

    fn delete_dialog(&mut self) {
        if let Some(id) = self.tree.selected_id() {
            self.session.dialog = Some(Dialog::ConfirmDelete { id: id.clone() });
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let confirm = matches!(self.session.dialog, Some(Dialog::ConfirmDelete { .. }));

        match key.code {
            KeyCode::Esc => self.session.dialog = None,
            KeyCode::Enter => self.submit_dialog(),
            KeyCode::Char('y') | KeyCode::Char('Y') if confirm => self.submit_dialog(),
            KeyCode::Char('n') | KeyCode::Char('N') if confirm => self.session.dialog = None,
            KeyCode::Backspace => {
                if let Some(input) = self.session.dialog.as_mut().and_then(Dialog::input_mut) {
                    input.pop();
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(input) = self.session.dialog.as_mut().and_then(Dialog::input_mut) {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    /// Apply the open dialog. Validation errors keep it open for another try.
    pub fn submit_dialog(&mut self) {
        let Some(dialog) = self.session.dialog.clone() else {
            return;
        };

        let result = match &dialog {
            Dialog::NewNode {
                parent,
                kind,
                input,
            } => self.create_node(parent.as_ref(), input.trim(), *kind),
            Dialog::Rename { id, input } => self.rename_node(id, input.trim()),
            Dialog::ConfirmDelete { id } => self.delete_node(id),
        };

        match result {
            Ok(()) => self.session.dialog = None,
            Err(e) => {
                self.notifier.error(&e);
                if !matches!(e, WorkspaceError::Validation { .. }) {
                    self.session.dialog = None;
                }
            }
        }
    }

    fn create_node(&mut self, parent: Option<&NodeId>, name: &str, kind: NodeKind) -> WorkspaceResult<()> {
        let id = self.store.create(parent, name, kind)?;
        if let Some(parent) = parent {
            self.tree.expand(&self.store, parent);
        }
        self.tree.refresh(&self.store);
        self.tree.select(&id);
        if kind == NodeKind::File {
            self.open_node(&id);
        }

        let title = match kind {
            NodeKind::File => "File created",
            NodeKind::Folder => "Folder created",
        };
        self.toast(title, format!("{} has been added", name));
        Ok(())
    }

    fn rename_node(&mut self, id: &NodeId, name: &str) -> WorkspaceResult<()> {
        let (old, kind) = self
            .store
            .find(id)
            .map(|n| (n.name.clone(), n.kind))
            .ok_or_else(|| WorkspaceError::not_found("node", id.as_str()))?;
        self.store.rename(id, name)?;
        self.tabs.rename_file(id, name);
        self.tree.refresh(&self.store);

        let title = match kind {
            NodeKind::File => "Renamed file",
            NodeKind::Folder => "Renamed folder",
        };
        self.toast(title, format!("{} has been renamed to {}", old, name));
        Ok(())
    }

    fn delete_node(&mut self, id: &NodeId) -> WorkspaceResult<()> {
        let (name, kind) = self
            .store
            .find(id)
            .map(|n| (n.name.clone(), n.kind))
            .ok_or_else(|| WorkspaceError::not_found("node", id.as_str()))?;
        let removed = self.store.delete(id)?;
        let closed = self.tabs.close_all_for(&removed);
        self.editor.retain_open(&self.tabs);
        self.tree.forget(&self.store, &removed);
        log::debug!("Deleted {} nodes, closed {} tabs", removed.len(), closed);

        let title = match kind {
            NodeKind::File => "File deleted",
            NodeKind::Folder => "Folder deleted",
        };
        self.toast(title, format!("{} has been removed", name));
        Ok(())
    }

    /// Mark the selected node for moving, or clear the mark
    fn toggle_mark(&mut self) {
        let selected = self.tree.selected_id().cloned();
        self.tree.marked = if self.tree.marked == selected {
            None
        } else {
            selected
        };
    }

    /// Move the marked node into the folder under the selection
    fn move_marked(&mut self) {
        let Some(marked) = self.tree.marked.clone() else {
            return;
        };
        let target = self.tree.target_folder(&self.store);

        if let Err(e) = self.store.move_node(&marked, target.as_ref()) {
            self.notifier.error(&e);
            return;
        }
        self.tree.marked = None;
        if let Some(target) = &target {
            self.tree.expand(&self.store, target);
        }
        self.tree.refresh(&self.store);
        self.tree.select(&marked);

        let Some(node) = self.store.find(&marked) else {
            return;
        };
        let title = match node.kind {
            NodeKind::File => "File moved",
            NodeKind::Folder => "Folder moved",
        };
        let destination = target
            .and_then(|t| self.store.path_of(&t))
            .unwrap_or_else(|| "the workspace root".to_string());
        let description = format!("{} has been moved to {}", node.name, destination);
        self.toast(title, description);
    }

    /// Open the selected file, or expand/collapse the selected folder
    fn open_selected(&mut self) {
        let Some(row) = self.tree.selected_row().cloned() else {
            return;
        };
        if row.is_folder() {
            self.tree.toggle(&self.store, &row.id);
        } else {
            self.open_node(&row.id);
        }
    }

    pub fn open_node(&mut self, id: &NodeId) {
        if let Some(node) = self.store.find(id) {
            self.tabs.open(node, &self.snippets);
            self.session.focus = Pane::Editor;
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.tree.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.tree.move_down(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.open_selected(),
            KeyCode::Left | KeyCode::Char('h') => {
                // Collapse, or jump to the parent folder
                if let Some(row) = self.tree.selected_row().cloned() {
                    if row.is_folder() && row.expanded {
                        self.tree.toggle(&self.store, &row.id);
                    } else if let Some(parent) = self.store.parent(&row.id).cloned() {
                        self.tree.select(&parent);
                    }
                }
            }
            KeyCode::Home | KeyCode::Char('g') => self.tree.go_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.tree.go_to_bottom(),
            KeyCode::PageUp => self.tree.page_up(10),
            KeyCode::PageDown => self.tree.page_down(10),
            KeyCode::Char('n') => self.new_node_dialog(NodeKind::File),
            KeyCode::Char('N') => self.new_node_dialog(NodeKind::Folder),
            KeyCode::Char('r') => self.rename_dialog(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_dialog(),
            KeyCode::Char('x') => self.toggle_mark(),
            KeyCode::Char('p') => self.move_marked(),
            KeyCode::Esc => self.tree.marked = None,
            _ => {}
        }
    }

    // ---- Editor ----

    /// Apply a text edit to the active tab
    fn edit_active<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut EditorState, &mut TabSet) -> WorkspaceResult<()>,
    {
        match edit(&mut self.editor, &mut self.tabs) {
            Ok(()) => {
                if self.config.editor.auto_save {
                    self.tabs.mark_saved();
                }
            }
            Err(e) => {
                self.notifier.error(&e);
            }
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let tab_width = self.config.editor.tab_width;

        let motion = match key.code {
            KeyCode::Left => Some(Motion::Left),
            KeyCode::Right => Some(Motion::Right),
            KeyCode::Up => Some(Motion::Up),
            KeyCode::Down => Some(Motion::Down),
            KeyCode::Home if ctrl => Some(Motion::Top),
            KeyCode::End if ctrl => Some(Motion::Bottom),
            KeyCode::Home => Some(Motion::Home),
            KeyCode::End => Some(Motion::End),
            KeyCode::PageUp => Some(Motion::PageUp),
            KeyCode::PageDown => Some(Motion::PageDown),
            _ => None,
        };
        if let Some(motion) = motion {
            return self.editor.apply_motion(&self.tabs, motion);
        }

        match key.code {
            KeyCode::Enter => self.edit_active(|editor, tabs| editor.newline(tabs)),
            KeyCode::Tab => self.edit_active(|editor, tabs| editor.indent(tabs, tab_width)),
            KeyCode::Backspace => self.edit_active(|editor, tabs| editor.backspace(tabs)),
            KeyCode::Delete => self.edit_active(|editor, tabs| editor.delete(tabs)),
            KeyCode::Char(c) if !ctrl => {
                self.edit_active(|editor, tabs| editor.insert(tabs, c.encode_utf8(&mut [0; 4])))
            }
            _ => {}
        }
    }

    fn new_scratch(&mut self) {
        let language = self.config.editor.default_language.clone();
        let id = self.tabs.open_scratch(&language);
        log::debug!("Opened scratch buffer {}", id);
        self.session.focus = Pane::Editor;
    }

    pub fn save(&mut self) {
        self.tabs.mark_saved();
        let title = self.tabs.active().title.clone();
        self.toast("File saved", format!("{} has been saved", title));
    }

    pub fn save_project(&mut self) {
        self.tabs.mark_all_saved();
        self.toast("Project saved", "Your changes have been saved successfully");
    }

    /// Run the active tab and show the output in the terminal
    pub fn run_active(&mut self) {
        let tab = self.tabs.active();
        let (title, code, language) = (tab.title.clone(), tab.content.clone(), tab.language.clone());
        self.toast("Running code", format!("Executing {}", title));

        let output = self.simulator.run(&code, &language);
        self.session.open_terminal();
        self.console.append_execution(&output);
    }

    pub fn copy_code(&mut self) {
        let tab = self.tabs.active();
        let (title, code) = (tab.title.clone(), tab.content.clone());
        match self.clipboard.set_text(&code) {
            Ok(()) => self.toast(
                "Copied to clipboard",
                format!("Code from {} copied to clipboard", title),
            ),
            Err(e) => {
                self.notifier.failure("Copy failed", e.to_string());
            }
        }
    }

    /// Write the active buffer into the download directory
    pub fn download(&mut self) {
        let tab = self.tabs.active();
        let (title, code) = (tab.title.clone(), tab.content.clone());
        match download::save_to(&self.download_dir, &title, &code) {
            Ok(path) => {
                log::info!("Downloaded {} to {}", title, path.display());
                self.toast("File downloaded", format!("{} has been downloaded", title));
            }
            Err(e) => {
                self.notifier.failure("Download failed", format!("{:#}", e));
            }
        }
    }

    pub fn format(&mut self) {
        let tab_width = self.config.editor.tab_width;
        let title = self.tabs.active().title.clone();
        match self.editor.format(&mut self.tabs, tab_width) {
            Ok(()) => {
                if self.config.editor.auto_save {
                    self.tabs.mark_saved();
                }
                self.toast("Code formatted", format!("{} has been formatted", title));
            }
            Err(e) => {
                self.notifier.error(&e);
            }
        }
    }

    pub fn close_tab(&mut self, id: &str) {
        match self.tabs.close(id) {
            Ok(tab) => {
                log::debug!("Closed tab {}", tab.title);
                self.editor.retain_open(&self.tabs);
            }
            Err(e) => {
                self.notifier.error(&e);
            }
        }
    }

    // ---- Terminal ----

    fn handle_terminal_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => {
                self.console.submit();
            }
            KeyCode::Backspace => self.console.backspace(),
            KeyCode::Up => self.console.history_up(),
            KeyCode::Down => self.console.history_down(),
            KeyCode::PageUp => self.console.scroll_up(10),
            KeyCode::PageDown => self.console.scroll_down(10),
            KeyCode::Esc => self.session.focus = Pane::Editor,
            KeyCode::Char(c) if !ctrl => {
                // Typing brings the log back to the newest output
                self.console.scroll_to_bottom();
                self.console.push_char(c);
            }
            _ => {}
        }
    }

    pub fn copy_terminal(&mut self) {
        let text = self.console.copy_text();
        match self.clipboard.set_text(&text) {
            Ok(()) => self.toast("Copied to clipboard", "Terminal output copied to clipboard"),
            Err(e) => {
                self.notifier.failure("Copy failed", e.to_string());
            }
        }
    }

    // ---- Mouse ----

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let Some(action) = map_mouse_event(mouse) else {
            return;
        };

        match action {
            MouseAction::Click { x, y } => self.handle_click(x, y),
            MouseAction::MiddleClick { x, y } => {
                if let Some(Hit::Tab(id)) = self.areas.hit_at(x, y).cloned() {
                    self.close_tab(&id);
                }
            }
            MouseAction::Drag { x, y } => {
                if let Some(target) = self.resizing {
                    self.handle_resize_drag(target, x, y);
                }
            }
            MouseAction::DragEnd { .. } => {
                if self.resizing.take().is_some() {
                    self.save_config();
                }
            }
            MouseAction::ScrollUp { x, y, amount } => self.handle_scroll(x, y, amount, true),
            MouseAction::ScrollDown { x, y, amount } => self.handle_scroll(x, y, amount, false),
        }
    }

    fn handle_click(&mut self, x: u16, y: u16) {
        let hit = self.areas.hit_at(x, y).cloned();

        if self.session.has_overlay() {
            match hit {
                Some(hit @ (Hit::PaletteRow(_) | Hit::SettingsRow(_) | Hit::Toast(_))) => {
                    self.handle_hit(hit)
                }
                _ if self.session.dialog.is_some() => {}
                _ => {
                    let inside = self
                        .areas
                        .overlay
                        .is_some_and(|r| ui::layout::contains(r, x, y));
                    if !inside {
                        self.close_panels();
                    }
                }
            }
            return;
        }

        if let Some(hit) = hit {
            return self.handle_hit(hit);
        }

        if let Some(target) = self.areas.divider_at(x, y) {
            self.resizing = Some(target);
            return;
        }

        match self.areas.pane_at(x, y) {
            Some(Pane::Tree) => {
                self.session.focus = Pane::Tree;
                if let Some(index) = ui::file_tree::row_at_position(self, x, y) {
                    self.tree.selected = index;
                    self.open_selected();
                }
            }
            Some(Pane::Editor) => {
                self.session.focus = Pane::Editor;
                if let Some((line, col)) = ui::editor::position_from_screen(self, x, y) {
                    self.editor.click(&self.tabs, line, col);
                }
            }
            Some(Pane::Terminal) => self.session.focus = Pane::Terminal,
            None => {}
        }
    }

    fn handle_hit(&mut self, hit: Hit) {
        match hit {
            Hit::Event(event) => self.handle_app_event(event),
            Hit::Tab(id) => {
                if let Err(e) = self.tabs.activate(&id) {
                    self.notifier.error(&e);
                }
                self.session.focus = Pane::Editor;
            }
            Hit::CloseTab(id) => self.close_tab(&id),
            Hit::NewTab => self.new_scratch(),
            Hit::TreeRoot(kind) => {
                self.session.dialog = Some(Dialog::NewNode {
                    parent: None,
                    kind,
                    input: String::new(),
                });
            }
            Hit::PaletteRow(index) => {
                let action = self.palette.results().get(index).map(|c| c.action);
                self.close_panels();
                if let Some(action) = action {
                    self.dispatch(action);
                }
            }
            Hit::SettingsRow(index) => {
                if self.session.settings_selected == index {
                    self.change_setting(self.session.settings_field(), true);
                } else {
                    self.session.settings_selected = index;
                }
            }
            Hit::Toast(id) => self.notifier.dismiss(id),
        }
    }

    fn handle_scroll(&mut self, x: u16, y: u16, amount: u16, up: bool) {
        if self.session.palette_open {
            for _ in 0..amount {
                if up {
                    self.palette.select_prev();
                } else {
                    self.palette.select_next();
                }
            }
            return;
        }
        if self.session.has_overlay() {
            return;
        }

        let amount = amount as usize;
        match self.areas.pane_at(x, y) {
            Some(Pane::Tree) => {
                for _ in 0..amount {
                    if up {
                        self.tree.move_up();
                    } else {
                        self.tree.move_down();
                    }
                }
            }
            Some(Pane::Editor) => {
                let motion = if up { Motion::Up } else { Motion::Down };
                for _ in 0..amount {
                    self.editor.apply_motion(&self.tabs, motion);
                }
            }
            Some(Pane::Terminal) => {
                if up {
                    self.console.scroll_up(amount);
                } else {
                    self.console.scroll_down(amount);
                }
            }
            None => {}
        }
    }

    /// Handle dragging a divider to resize a pane
    fn handle_resize_drag(&mut self, target: ResizeTarget, x: u16, y: u16) {
        let content = self.areas.content;
        if content.width == 0 || content.height == 0 {
            return;
        }
        match target {
            ResizeTarget::Sidebar => {
                let width = x.saturating_sub(content.x) as u32 + 1;
                let percent = (width * 100 / content.width as u32) as u16;
                self.config.ui.sidebar_width = percent.clamp(10, 60);
            }
            ResizeTarget::Terminal => {
                let rows = (content.y + content.height).saturating_sub(y) as u32;
                let percent = (rows * 100 / content.height as u32) as u16;
                self.config.ui.terminal_height = percent.clamp(10, 80);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ToastKind;
    use crate::terminal::LogKind;

    fn app() -> App {
        App::headless(Config::default(), std::env::temp_dir())
    }

    fn last_toast(app: &App) -> (String, String) {
        let toast = app.notifier.visible().last().expect("a toast");
        (toast.title.clone(), toast.description.clone())
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_event(Event::Key(KeyEvent::new(code, modifiers)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_create_file_in_folder() {
        let mut app = app();
        app.session.dialog = Some(Dialog::NewNode {
            parent: Some(NodeId::from("7")),
            kind: NodeKind::File,
            input: "app.js".to_string(),
        });
        app.submit_dialog();

        assert!(app.session.dialog.is_none());
        assert_eq!(app.store.children(Some(&NodeId::from("7"))).len(), 2);
        assert!(app.tree.is_expanded(&NodeId::from("7")));
        assert_eq!(
            last_toast(&app),
            ("File created".to_string(), "app.js has been added".to_string())
        );
        assert_eq!(app.tree.selected_row().map(|r| r.name.as_str()), Some("app.js"));
        assert_eq!(app.tabs.active().title, "app.js");
        assert_eq!(app.tabs.active().content, "// Empty file");
        assert_eq!(app.session.focus, Pane::Editor);
    }

    #[test]
    fn test_invalid_name_keeps_dialog_open() {
        let mut app = app();
        app.session.dialog = Some(Dialog::NewNode {
            parent: None,
            kind: NodeKind::File,
            input: "no extension".to_string(),
        });
        app.submit_dialog();

        assert!(app.session.dialog.is_some());
        let toast = app.notifier.visible().last().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Invalid name");
    }

    #[test]
    fn test_dialog_typing() {
        let mut app = app();
        app.session.focus = Pane::Tree;
        app.tree.select(&NodeId::from("7"));
        press(&mut app, KeyCode::Char('N'), KeyModifiers::SHIFT);
        type_text(&mut app, "assets");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(last_toast(&app).0, "Folder created");
        let public = app.store.children(Some(&NodeId::from("7")));
        let names: Vec<_> = public
            .iter()
            .filter_map(|id| app.store.find(id))
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["index.html", "assets"]);
    }

    #[test]
    fn test_rename_updates_open_tab() {
        let mut app = app();
        app.open_node(&NodeId::from("2"));
        app.session.dialog = Some(Dialog::Rename {
            id: NodeId::from("2"),
            input: "main.js".to_string(),
        });
        app.submit_dialog();

        assert_eq!(app.tabs.active().title, "main.js");
        assert_eq!(
            last_toast(&app),
            (
                "Renamed file".to_string(),
                "index.js has been renamed to main.js".to_string()
            )
        );
    }

    #[test]
    fn test_delete_folder_closes_tabs() {
        let mut app = app();
        app.open_node(&NodeId::from("5"));
        assert!(app.tabs.contains("5"));

        app.session.dialog = Some(Dialog::ConfirmDelete { id: NodeId::from("1") });
        press(&mut app, KeyCode::Char('y'), KeyModifiers::NONE);

        assert!(!app.tabs.contains("5"));
        assert!(app.store.find(&NodeId::from("2")).is_none());
        assert!(app.tree.rows.iter().all(|r| r.name != "index.js"));
        assert_eq!(
            last_toast(&app),
            ("Folder deleted".to_string(), "src has been removed".to_string())
        );
    }

    #[test]
    fn test_move_marked_node() {
        let mut app = app();
        app.session.focus = Pane::Tree;
        app.tree.select(&NodeId::from("9"));
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        app.tree.select(&NodeId::from("7"));
        press(&mut app, KeyCode::Char('p'), KeyModifiers::NONE);

        assert_eq!(app.store.parent(&NodeId::from("9")), Some(&NodeId::from("7")));
        assert!(app.tree.marked.is_none());
        assert_eq!(last_toast(&app).0, "File moved");
    }

    #[test]
    fn test_run_appends_output() {
        let mut app = app();
        let id = app.tabs.open_scratch("javascript");
        app.tabs.edit(&id, "console.log(1 + 1);").unwrap();
        press(&mut app, KeyCode::F(5), KeyModifiers::NONE);

        assert!(app.session.terminal_open);
        let last = app.console.entries().last().unwrap();
        assert_eq!(last.kind, LogKind::Success);
        assert_eq!(last.text, "2");
        assert_eq!(
            last_toast(&app),
            ("Running code".to_string(), "Executing untitled-1.js".to_string())
        );
    }

    #[test]
    fn test_close_last_tab_is_refused() {
        let mut app = app();
        press(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL);

        assert_eq!(app.tabs.len(), 1);
        assert_eq!(
            last_toast(&app),
            (
                "Cannot close tab".to_string(),
                "At least one tab must remain open".to_string()
            )
        );
    }

    #[test]
    fn test_palette_runs_command() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'), KeyModifiers::CONTROL);
        assert!(app.session.palette_open);

        type_text(&mut app, "light");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert!(!app.session.palette_open);
        assert_eq!(app.session.theme, ThemeMode::Light);
        assert_eq!(app.theme, Theme::light());
        assert_eq!(app.config.ui.theme, "light");
        assert_eq!(last_toast(&app).0, "Light theme activated");
    }

    #[test]
    fn test_palette_new_file_opens_dialog() {
        let mut app = app();
        app.dispatch(CommandAction::NewFile);
        assert!(matches!(
            app.session.dialog,
            Some(Dialog::NewNode { parent: None, kind: NodeKind::File, .. })
        ));
    }

    #[test]
    fn test_settings_panel_changes_values() {
        let mut app = app();
        press(&mut app, KeyCode::F(10), KeyModifiers::NONE);
        assert!(app.session.settings_open);

        // Tab width is the fourth row
        for _ in 0..3 {
            press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        }
        press(&mut app, KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.config.editor.tab_width, 3);

        for _ in 0..10 {
            press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        }
        assert_eq!(app.config.editor.tab_width, 1);

        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(app.config.editor.default_language, "typescript");

        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(!app.session.settings_open);
    }

    #[test]
    fn test_typing_respects_auto_save() {
        let mut app = app();
        type_text(&mut app, "x");
        assert!(app.tabs.active().content.starts_with('x'));
        assert!(!app.tabs.active().modified);

        app.config.editor.auto_save = false;
        type_text(&mut app, "y");
        assert!(app.tabs.active().content.starts_with("xy"));
        assert!(app.tabs.active().modified);

        press(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(!app.tabs.active().modified);
        assert_eq!(
            last_toast(&app),
            ("File saved".to_string(), "welcome.md has been saved".to_string())
        );
    }

    #[test]
    fn test_format_active_buffer() {
        let mut app = app();
        let id = app.tabs.open_scratch("javascript");
        app.tabs.edit(&id, "if (a) {\nb();\n}").unwrap();
        app.format();

        assert_eq!(app.tabs.active().content, "if (a) {\n  b();\n}");
        assert_eq!(last_toast(&app).0, "Code formatted");
    }

    #[test]
    fn test_download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::headless(Config::default(), dir.path().to_path_buf());
        app.download();

        let written = std::fs::read_to_string(dir.path().join("welcome.md")).unwrap();
        assert_eq!(written, app.tabs.active().content);
        assert_eq!(
            last_toast(&app),
            ("File downloaded".to_string(), "welcome.md has been downloaded".to_string())
        );
    }

    #[test]
    fn test_copy_without_clipboard_reports_failure() {
        let mut app = app();
        app.copy_code();
        let toast = app.notifier.visible().last().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.title, "Copy failed");
    }

    #[test]
    fn test_terminal_input() {
        let mut app = app();
        press(&mut app, KeyCode::F(4), KeyModifiers::NONE);
        assert!(app.session.terminal_open);
        assert_eq!(app.session.focus, Pane::Terminal);

        type_text(&mut app, "echo hi");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        let texts: Vec<_> = app.console.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts[texts.len() - 2..], ["$ echo hi", "hi"]);

        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.console.input(), "echo hi");
    }

    #[test]
    fn test_terminal_header_buttons() {
        let mut app = app();
        app.console.process("echo hi");
        app.handle_hit(Hit::Event(AppEvent::ClearTerminal));
        let texts: Vec<_> = app.console.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Terminal cleared"]);

        app.handle_hit(Hit::Event(AppEvent::CopyTerminal));
        assert_eq!(app.notifier.visible().last().unwrap().title, "Copy failed");

        app.handle_hit(Hit::Event(AppEvent::ToggleTerminal));
        assert!(app.session.terminal_open);
        app.handle_hit(Hit::Event(AppEvent::ToggleTerminal));
        assert!(!app.session.terminal_open);
    }

    #[test]
    fn test_resize_drag_updates_config() {
        let mut app = app();
        app.areas.content = Rect::new(0, 1, 100, 40);
        app.handle_resize_drag(ResizeTarget::Sidebar, 29, 10);
        assert_eq!(app.config.ui.sidebar_width, 30);

        app.handle_resize_drag(ResizeTarget::Terminal, 10, 21);
        assert_eq!(app.config.ui.terminal_height, 50);
    }
}
