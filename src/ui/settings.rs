use crate::app::App;
use crate::session::SettingsField;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::layout::{centered, Hit};

/// Display value of a settings row
pub fn value_of(app: &App, field: SettingsField) -> String {
    let on_off = |b: bool| if b { "On" } else { "Off" }.to_string();
    match field {
        SettingsField::Theme => app.session.theme.name().to_string(),
        SettingsField::DefaultLanguage => app.config.editor.default_language.clone(),
        SettingsField::AutoSave => on_off(app.config.editor.auto_save),
        SettingsField::TabWidth => app.config.editor.tab_width.to_string(),
        SettingsField::LineNumbers => on_off(app.config.editor.show_line_numbers),
        SettingsField::Starfield => on_off(app.config.ui.starfield),
    }
}

/// Draw the settings panel
pub fn draw(frame: &mut Frame, app: &mut App) {
    let height = SettingsField::ALL.len() as u16 + 7;
    let area = centered(frame.area(), 52, height);
    frame.render_widget(Clear, area);
    app.areas.overlay = Some(area);

    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focused))
        .style(Style::default().fg(app.theme.fg).bg(app.theme.popup_bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut hits = Vec::new();
    for (index, field) in SettingsField::ALL.iter().enumerate() {
        if index as u16 >= inner.height {
            break;
        }
        let rect = Rect::new(inner.x, inner.y + index as u16, inner.width, 1);
        let selected = index == app.session.settings_selected;
        let style = if selected {
            Style::default().fg(app.theme.tab_active_fg).bg(app.theme.tree_selected_bg)
        } else {
            Style::default().fg(app.theme.fg)
        };
        let value = format!("‹ {} ›", value_of(app, *field));
        let label = format!(" {:<18}", field.label());
        let padding = (rect.width as usize).saturating_sub(label.chars().count() + value.chars().count() + 1);
        let line = Line::from(vec![
            Span::raw(label),
            Span::raw(" ".repeat(padding)),
            Span::styled(value, Style::default().fg(app.theme.accent)),
            Span::raw(" "),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), rect);
        hits.push((rect, Hit::SettingsRow(index)));
    }

    let about_y = inner.y + SettingsField::ALL.len() as u16 + 1;
    if about_y + 3 < inner.y + inner.height {
        let about = vec![
            Line::from(Span::styled(" About", Style::default().fg(app.theme.muted))),
            Line::from(Span::styled(
                " NebulaCode Studio",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(" Version 1.0.0", Style::default().fg(app.theme.muted))),
        ];
        frame.render_widget(Paragraph::new(about), Rect::new(inner.x, about_y, inner.width, 3));
    }

    let hint_y = inner.y + inner.height.saturating_sub(1);
    frame.render_widget(
        Paragraph::new(" ↑/↓ select  ←/→/Enter change  Esc close")
            .style(Style::default().fg(app.theme.muted)),
        Rect::new(inner.x, hint_y, inner.width, 1),
    );

    for (rect, hit) in hits {
        app.areas.push(rect, hit);
    }
}
