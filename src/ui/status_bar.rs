use crate::app::App;
use crate::language;
use crate::session::Pane;
use ratatui::{prelude::*, widgets::Paragraph};
use unicode_width::UnicodeWidthStr;

/// Draw the status bar at the bottom of the screen
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let style = Style::default()
        .fg(app.theme.statusbar_fg)
        .bg(app.theme.statusbar_bg);

    let tab = app.tabs.active();
    let cursor = app.editor.cursor(&tab.id);
    let line_count = tab.content.split('\n').count();
    let mod_indicator = if tab.modified { " [+]" } else { "" };

    let left_status = format!(
        " Ln {}/{}, Col {} | Spaces: {} | {}{}",
        cursor.line + 1,
        line_count,
        cursor.col + 1,
        app.config.editor.tab_width,
        language::display_name(&tab.language),
        mod_indicator
    );

    let pane_name = match app.session.focus {
        Pane::Tree => "Explorer",
        Pane::Editor => "Editor",
        Pane::Terminal => "Terminal",
    };
    let right_status = format!(" {} | {} ", pane_name, app.session.theme.name());

    let total_len = left_status.width() + right_status.width();
    let padding = (area.width as usize).saturating_sub(total_len);

    let full_text = format!("{}{}{}", left_status, " ".repeat(padding), right_status);
    frame.render_widget(Paragraph::new(full_text).style(style), area);
}
