use crate::app::App;
use crate::input::AppEvent;
use crate::terminal::LogKind;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

const HEADER_BUTTONS: &[(&str, AppEvent)] = &[
    (" Copy ", AppEvent::CopyTerminal),
    (" Clear ", AppEvent::ClearTerminal),
    (" ✕ ", AppEvent::ToggleTerminal),
];

/// Draw the terminal pane: the log above a `$` input line
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect, focused: bool) {
    let border_color = if focused {
        app.theme.border_focused
    } else {
        app.theme.border
    };

    let block = Block::default()
        .title(" Terminal ")
        .borders(Borders::TOP)
        .border_style(Style::default().fg(border_color))
        .style(super::surface(app, app.theme.terminal_bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Store terminal area for mouse handling
    app.areas.terminal = Some(area);
    draw_header_buttons(frame, app, area);

    if inner.height == 0 {
        return;
    }
    let log_height = inner.height.saturating_sub(1) as usize;
    let theme = &app.theme;

    let mut rows: Vec<Line> = Vec::new();
    for entry in app.console.entries() {
        let color = match entry.kind {
            LogKind::Info => theme.log_info,
            LogKind::Warning => theme.log_warning,
            LogKind::Error => theme.log_error,
            LogKind::Success => theme.log_success,
            LogKind::Command => theme.log_command,
        };
        let stamp = entry.created_at.format("%H:%M:%S").to_string();
        let mut first = true;
        for text in entry.text.lines().chain(entry.text.is_empty().then_some("")) {
            let prefix = if first {
                format!("[{}] ", stamp)
            } else {
                " ".repeat(stamp.len() + 3)
            };
            first = false;
            rows.push(Line::from(vec![
                Span::styled(prefix, Style::default().fg(theme.muted)),
                Span::styled(text.to_string(), Style::default().fg(color)),
            ]));
        }
    }

    // scroll_offset counts lines up from the newest
    let end = rows.len().saturating_sub(app.console.scroll_offset);
    let start = end.saturating_sub(log_height);
    let visible: Vec<Line> = rows.drain(start..end).collect();
    let log_area = Rect::new(inner.x, inner.y, inner.width, log_height as u16);
    frame.render_widget(Paragraph::new(visible), log_area);

    let input_y = inner.y + inner.height - 1;
    let prompt = Line::from(vec![
        Span::styled("$ ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled(app.console.input().to_string(), Style::default().fg(theme.fg)),
    ]);
    frame.render_widget(
        Paragraph::new(prompt),
        Rect::new(inner.x, input_y, inner.width, 1),
    );

    if focused && !app.session.has_overlay() {
        let x = inner.x + 2 + app.console.input().chars().count() as u16;
        if x < inner.x + inner.width {
            frame.set_cursor_position((x, input_y));
        }
    }
}

/// Copy, clear and close buttons on the right of the header row
fn draw_header_buttons(frame: &mut Frame, app: &mut App, area: Rect) {
    let total: u16 = HEADER_BUTTONS.iter().map(|(label, _)| label.width() as u16 + 1).sum();
    if area.height == 0 || total + 12 > area.width {
        return;
    }
    let mut x = area.x + area.width - total;
    for (label, event) in HEADER_BUTTONS {
        let width = label.width() as u16;
        let rect = Rect::new(x, area.y, width, 1);
        let style = Style::default().fg(app.theme.fg).bg(app.theme.tab_inactive_bg);
        frame.render_widget(Paragraph::new(*label).style(style), rect);
        app.areas.push(rect, Hit::Event(*event));
        x += width + 1;
    }
}
