use crate::app::App;
use crate::notify::ToastKind;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

const MAX_WIDTH: u16 = 44;

/// Stack visible toasts in the bottom-right corner, newest at the bottom
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect) {
    let mut bottom = area.y + area.height;
    let mut hits = Vec::new();

    for toast in app.notifier.visible().iter().rev() {
        let text_width = toast.title.width().max(toast.description.width()) as u16;
        let width = (text_width + 4).min(MAX_WIDTH).min(area.width);
        let height = 4;
        if bottom < area.y + height {
            break;
        }
        bottom -= height;
        let rect = Rect::new(area.x + area.width - width, bottom, width, height);

        let border = match toast.kind {
            ToastKind::Normal => app.theme.accent,
            ToastKind::Error => app.theme.log_error,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().fg(app.theme.fg).bg(app.theme.popup_bg));
        let text = vec![
            Line::from(Span::styled(
                toast.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                toast.description.clone(),
                Style::default().fg(app.theme.muted),
            )),
        ];
        frame.render_widget(Clear, rect);
        frame.render_widget(Paragraph::new(text).block(block), rect);
        hits.push((rect, Hit::Toast(toast.id)));
    }

    for (rect, hit) in hits {
        app.areas.push(rect, hit);
    }
}
