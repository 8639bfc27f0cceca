use crate::app::App;
use crate::input::AppEvent;
use ratatui::{prelude::*, widgets::Paragraph};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

const BUTTONS: &[(&str, AppEvent)] = &[
    (" Save ", AppEvent::SaveProject),
    (" Palette ", AppEvent::OpenPalette),
    (" Terminal ", AppEvent::ToggleTerminal),
    (" Settings ", AppEvent::OpenSettings),
];

/// Draw the brand and the navbar buttons
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let base = Style::default().fg(theme.fg).bg(theme.navbar_bg);
    frame.render_widget(Paragraph::new("").style(base), area);

    let brand = Line::from(vec![
        Span::styled(
            " </> ",
            Style::default()
                .fg(theme.navbar_bg)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" NebulaCode ", base.add_modifier(Modifier::BOLD)),
        Span::styled("STUDIO", Style::default().fg(theme.accent).bg(theme.navbar_bg)),
    ]);
    frame.render_widget(Paragraph::new(brand), area);

    let total: u16 = BUTTONS
        .iter()
        .map(|(label, _)| label.width() as u16 + 1)
        .sum();
    let mut x = area.x + area.width.saturating_sub(total);
    let button_style = Style::default().fg(theme.fg).bg(theme.tab_inactive_bg);
    let active_style = Style::default().fg(theme.navbar_bg).bg(theme.accent);

    for (label, event) in BUTTONS {
        let width = label.width() as u16;
        if x + width > area.x + area.width {
            break;
        }
        let active = match event {
            AppEvent::ToggleTerminal => app.session.terminal_open,
            AppEvent::OpenPalette => app.session.palette_open,
            AppEvent::OpenSettings => app.session.settings_open,
            _ => false,
        };
        let rect = Rect::new(x, area.y, width, 1);
        let style = if active { active_style } else { button_style };
        frame.render_widget(Paragraph::new(*label).style(style), rect);
        app.areas.push(rect, Hit::Event(*event));
        x += width + 1;
    }
}
