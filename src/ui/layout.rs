use crate::app::App;
use crate::file_tree::NodeKind;
use crate::input::AppEvent;
use crate::session::Pane;
use ratatui::prelude::*;

use super::{editor, file_tree, tab_bar, terminal, toolbar};

/// Something clickable drawn this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    /// A button that fires an app event
    Event(AppEvent),
    Tab(String),
    CloseTab(String),
    NewTab,
    /// Root-level "new file" / "new folder" buttons of the explorer
    TreeRoot(NodeKind),
    PaletteRow(usize),
    SettingsRow(usize),
    Toast(u64),
}

/// Which divider is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTarget {
    Sidebar,
    Terminal,
}

/// Stores the calculated areas for hit testing
#[derive(Debug, Clone, Default)]
pub struct LayoutAreas {
    hits: Vec<(Rect, Hit)>,
    /// Rows of the explorer
    pub file_tree: Option<Rect>,
    /// Text area of the editor, gutter included
    pub editor: Option<Rect>,
    pub gutter_width: u16,
    pub terminal: Option<Rect>,
    pub sidebar_divider: Option<Rect>,
    pub terminal_divider: Option<Rect>,
    /// Sidebar plus editor column
    pub content: Rect,
    /// Open palette or settings popup
    pub overlay: Option<Rect>,
}

impl LayoutAreas {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push(&mut self, rect: Rect, hit: Hit) {
        self.hits.push((rect, hit));
    }

    /// Topmost clickable at a screen position
    pub fn hit_at(&self, x: u16, y: u16) -> Option<&Hit> {
        self.hits
            .iter()
            .rev()
            .find(|(rect, _)| contains(*rect, x, y))
            .map(|(_, hit)| hit)
    }

    pub fn divider_at(&self, x: u16, y: u16) -> Option<ResizeTarget> {
        if self.sidebar_divider.is_some_and(|r| contains(r, x, y)) {
            Some(ResizeTarget::Sidebar)
        } else if self.terminal_divider.is_some_and(|r| contains(r, x, y)) {
            Some(ResizeTarget::Terminal)
        } else {
            None
        }
    }

    /// Determine which pane contains the given coordinates
    pub fn pane_at(&self, x: u16, y: u16) -> Option<Pane> {
        if self.file_tree.is_some_and(|r| contains(r, x, y)) {
            Some(Pane::Tree)
        } else if self.terminal.is_some_and(|r| contains(r, x, y)) {
            Some(Pane::Terminal)
        } else if self.editor.is_some_and(|r| contains(r, x, y)) {
            Some(Pane::Editor)
        } else {
            None
        }
    }
}

pub fn contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Width of the sidebar for a percentage of the content width
pub fn sidebar_width(total: u16, percent: u16) -> u16 {
    let width = (total as u32 * percent as u32 / 100) as u16;
    width.clamp(14, total.saturating_sub(30).max(14))
}

/// Height of the terminal for a percentage of the editor column
pub fn terminal_height(total: u16, percent: u16) -> u16 {
    let height = (total as u32 * percent as u32 / 100) as u16;
    height.clamp(4, total.saturating_sub(6).max(4))
}

/// Draw the main content area (file tree + editor + terminal)
pub fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    app.areas.content = area;

    if app.session.sidebar_open {
        let width = sidebar_width(area.width, app.config.ui.sidebar_width);
        let h_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(width), Constraint::Min(30)])
            .split(area);

        let focused = app.session.focus == Pane::Tree;
        file_tree::draw(frame, app, h_chunks[0], focused);
        app.areas.sidebar_divider = Some(Rect::new(
            h_chunks[0].x + h_chunks[0].width.saturating_sub(1),
            area.y,
            1,
            area.height,
        ));

        draw_editor_terminal(frame, app, h_chunks[1]);
    } else {
        draw_editor_terminal(frame, app, area);
    }
}

/// Draw the editor and terminal panes (stacked vertically)
fn draw_editor_terminal(frame: &mut Frame, app: &mut App, area: Rect) {
    let terminal_rows = if app.session.terminal_open {
        terminal_height(area.height, app.config.ui.terminal_height)
    } else {
        0
    };

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),             // Tab bar
            Constraint::Length(1),             // Toolbar
            Constraint::Min(3),                // Editor
            Constraint::Length(terminal_rows), // Terminal (0 when closed)
        ])
        .split(area);

    tab_bar::draw(frame, app, v_chunks[0]);
    toolbar::draw(frame, app, v_chunks[1]);
    let focused = app.session.focus == Pane::Editor;
    editor::draw(frame, app, v_chunks[2], focused);

    if terminal_rows > 0 {
        app.areas.terminal_divider = Some(Rect::new(v_chunks[3].x, v_chunks[3].y, v_chunks[3].width, 1));
        let focused = app.session.focus == Pane::Terminal;
        terminal::draw(frame, app, v_chunks[3], focused);
    }
}

/// Centered popup of at most `width` x `height` cells
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_at_prefers_topmost() {
        let mut areas = LayoutAreas::default();
        areas.push(Rect::new(0, 0, 10, 5), Hit::NewTab);
        areas.push(Rect::new(2, 1, 3, 1), Hit::PaletteRow(0));

        assert_eq!(areas.hit_at(3, 1), Some(&Hit::PaletteRow(0)));
        assert_eq!(areas.hit_at(0, 0), Some(&Hit::NewTab));
        assert_eq!(areas.hit_at(10, 0), None);

        areas.clear();
        assert_eq!(areas.hit_at(0, 0), None);
    }

    #[test]
    fn test_pane_sizes_are_clamped() {
        assert_eq!(sidebar_width(100, 22), 22);
        assert_eq!(sidebar_width(100, 90), 70);
        assert_eq!(sidebar_width(100, 1), 14);
        assert_eq!(terminal_height(40, 35), 14);
        assert_eq!(terminal_height(40, 100), 34);
        assert_eq!(terminal_height(8, 10), 4);
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 40, 10), Rect::new(20, 7, 40, 10));
        assert_eq!(centered(area, 200, 200), Rect::new(1, 1, 78, 22));
    }

    #[test]
    fn test_pane_at() {
        let areas = LayoutAreas {
            file_tree: Some(Rect::new(0, 1, 20, 10)),
            editor: Some(Rect::new(20, 3, 60, 8)),
            terminal: Some(Rect::new(20, 11, 60, 5)),
            ..LayoutAreas::default()
        };
        assert_eq!(areas.pane_at(5, 5), Some(Pane::Tree));
        assert_eq!(areas.pane_at(30, 5), Some(Pane::Editor));
        assert_eq!(areas.pane_at(30, 12), Some(Pane::Terminal));
        assert_eq!(areas.pane_at(30, 0), None);
    }
}
