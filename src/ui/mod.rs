pub mod dialog;
pub mod editor;
pub mod file_tree;
pub mod layout;
mod navbar;
mod palette;
pub mod settings;
mod starfield;
mod status_bar;
mod tab_bar;
mod terminal;
mod toast;
mod toolbar;

use crate::app::App;
use ratatui::prelude::*;

pub use layout::{Hit, LayoutAreas, ResizeTarget};

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    app.areas.clear();

    // Check minimum size
    if area.width < 80 || area.height < 24 {
        draw_size_warning(frame, area);
        return;
    }

    // Backdrop first so panes without their own background show it
    if app.config.ui.starfield {
        starfield::draw(frame, app, area);
    } else {
        frame.buffer_mut().set_style(area, Style::default().bg(app.theme.bg));
    }

    // Main layout: navbar, content, status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Navbar
            Constraint::Min(10),   // Content area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    navbar::draw(frame, app, main_chunks[0]);
    layout::draw_content(frame, app, main_chunks[1]);
    status_bar::draw(frame, app, main_chunks[2]);

    if app.session.palette_open {
        palette::draw(frame, app);
    }
    if app.session.settings_open {
        settings::draw(frame, app);
    }
    toast::draw(frame, app, main_chunks[1]);

    // Draw dialog LAST so it appears on top of everything
    if app.session.dialog.is_some() {
        dialog::draw_dialog(frame, app);
    }
}

/// Pane background: clear over the starfield, solid otherwise
fn surface(app: &App, color: Color) -> Style {
    if app.config.ui.starfield {
        Style::default().fg(app.theme.fg)
    } else {
        Style::default().fg(app.theme.fg).bg(color)
    }
}

/// Draw a warning when terminal is too small
fn draw_size_warning(frame: &mut Frame, area: Rect) {
    use ratatui::widgets::{Block, Borders, Paragraph};

    let warning = Paragraph::new("Terminal too small!\nMinimum: 80x24")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("NebulaCode"));

    frame.render_widget(warning, area);
}
