use crate::app::App;
use crate::input::AppEvent;
use crate::language;
use ratatui::{prelude::*, widgets::Paragraph};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

const BUTTONS: &[(&str, AppEvent)] = &[
    (" Format ", AppEvent::Format),
    (" Copy ", AppEvent::CopyCode),
    (" Download ", AppEvent::Download),
    (" Save ", AppEvent::Save),
    (" ▶ Run ", AppEvent::Run),
];

/// Draw the editor toolbar: file info on the left, actions on the right
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect) {
    let tab = app.tabs.active();
    let info = Line::from(vec![
        Span::styled(
            format!(" {} ", language::display_name(&tab.language)),
            Style::default().fg(app.theme.accent_alt),
        ),
        Span::styled(tab.title.clone(), Style::default().fg(app.theme.muted)),
    ]);
    frame.render_widget(Paragraph::new(info), area);

    let total: u16 = BUTTONS.iter().map(|(label, _)| label.width() as u16 + 1).sum();
    if total + 20 > area.width {
        return;
    }
    let mut x = area.x + area.width - total;
    for (label, event) in BUTTONS {
        let width = label.width() as u16;
        let style = if *event == AppEvent::Run {
            Style::default().fg(app.theme.navbar_bg).bg(app.theme.accent)
        } else {
            Style::default().fg(app.theme.fg).bg(app.theme.tab_inactive_bg)
        };
        let rect = Rect::new(x, area.y, width, 1);
        frame.render_widget(Paragraph::new(*label).style(style), rect);
        app.areas.push(rect, Hit::Event(*event));
        x += width + 1;
    }
}
