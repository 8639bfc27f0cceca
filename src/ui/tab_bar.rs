use crate::app::App;
use ratatui::{prelude::*, widgets::Paragraph};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

/// Draw the tab bar showing open buffers
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let bg_style = Style::default().fg(theme.tab_inactive_fg);
    let active_style = Style::default()
        .fg(theme.tab_active_fg)
        .bg(theme.tab_active_bg)
        .add_modifier(Modifier::BOLD);
    let inactive_style = Style::default()
        .fg(theme.tab_inactive_fg)
        .bg(theme.tab_inactive_bg);
    let modified_style = Style::default().fg(theme.accent);

    let mut x = area.x;
    let right = area.x + area.width;
    let active_index = app.tabs.active_index();
    let mut hits = Vec::new();

    for (i, tab) in app.tabs.tabs().iter().enumerate() {
        let style = if i == active_index {
            active_style
        } else {
            inactive_style
        };
        let marker = if tab.modified { "●" } else { " " };
        let title = format!(" {}", tab.title);
        let width = title.width() as u16 + 4; // marker, space, close, space

        // Leave room for the "+" button
        if x + width + 3 > right {
            break;
        }

        let title_rect = Rect::new(x, area.y, title.width() as u16 + 2, 1);
        let close_rect = Rect::new(x + title_rect.width, area.y, 2, 1);
        let line = Line::from(vec![
            Span::styled(title, style),
            Span::styled(marker, modified_style.bg(style.bg.unwrap_or(Color::Reset))),
            Span::styled(" ", style),
            Span::styled("×", style),
            Span::styled(" ", style),
        ]);
        frame.render_widget(Paragraph::new(line), Rect::new(x, area.y, width, 1));
        hits.push((title_rect, Hit::Tab(tab.id.clone())));
        hits.push((close_rect, Hit::CloseTab(tab.id.clone())));

        x += width;
        frame.render_widget(Paragraph::new("│").style(bg_style), Rect::new(x, area.y, 1, 1));
        x += 1;
    }

    if x + 3 <= right {
        let rect = Rect::new(x, area.y, 3, 1);
        frame.render_widget(
            Paragraph::new(" + ").style(Style::default().fg(app.theme.accent)),
            rect,
        );
        hits.push((rect, Hit::NewTab));
    }

    for (rect, hit) in hits {
        app.areas.push(rect, hit);
    }
}
