use crate::app::App;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::layout::{centered, Hit};

/// Draw the command palette over the workspace
pub fn draw(frame: &mut Frame, app: &mut App) {
    let results = app.palette.results();
    let height = (results.len() as u16).clamp(1, 10) + 4;
    let area = centered(frame.area(), 60, height);
    frame.render_widget(Clear, area);
    app.areas.overlay = Some(area);

    let theme = &app.theme;
    let block = Block::default()
        .title(" Command Palette ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().fg(theme.fg).bg(theme.popup_bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 {
        return;
    }

    let query = Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent)),
        Span::raw(app.palette.query().to_string()),
    ]);
    frame.render_widget(Paragraph::new(query), Rect::new(inner.x, inner.y, inner.width, 1));
    let cursor_x = inner.x + 2 + app.palette.query().width() as u16;
    if cursor_x < inner.x + inner.width {
        frame.set_cursor_position((cursor_x, inner.y));
    }

    let list_area = Rect::new(inner.x, inner.y + 2, inner.width, inner.height - 2);
    if results.is_empty() {
        frame.render_widget(
            Paragraph::new(" No commands found").style(Style::default().fg(theme.muted)),
            list_area,
        );
        return;
    }

    // Keep the selection inside the list window
    let rows = list_area.height as usize;
    let selected = app.palette.selected();
    let first = (selected + 1).saturating_sub(rows);

    let mut hits = Vec::new();
    for (row, (index, command)) in results.iter().enumerate().skip(first).take(rows).enumerate() {
        let rect = Rect::new(list_area.x, list_area.y + row as u16, list_area.width, 1);
        let style = if index == selected {
            Style::default().fg(theme.tab_active_fg).bg(theme.tree_selected_bg)
        } else {
            Style::default().fg(theme.fg)
        };
        let title = format!(" {}", command.title);
        let padding = (rect.width as usize).saturating_sub(title.width() + command.shortcut.width() + 1);
        let line = Line::from(vec![
            Span::raw(title),
            Span::raw(" ".repeat(padding)),
            Span::styled(command.shortcut, Style::default().fg(theme.muted)),
            Span::raw(" "),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), rect);
        hits.push((rect, Hit::PaletteRow(index)));
    }
    for (rect, hit) in hits {
        app.areas.push(rect, hit);
    }
}
