use crate::app::App;
use crate::file_tree::NodeKind;
use crate::session::Dialog;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::layout::centered;

/// Draw the active modal dialog, if any
pub fn draw_dialog(frame: &mut Frame, app: &App) {
    let Some(dialog) = &app.session.dialog else {
        return;
    };

    match dialog {
        Dialog::NewNode { parent, kind, input } => {
            let location = parent
                .as_ref()
                .and_then(|id| app.store.path_of(id))
                .unwrap_or_else(|| "workspace root".to_string());
            let title = match kind {
                NodeKind::File => " New File ",
                NodeKind::Folder => " New Folder ",
            };
            let hint = match kind {
                NodeKind::File => "e.g. main.js",
                NodeKind::Folder => "e.g. components",
            };
            draw_prompt(frame, app, title, &format!("In {}  ({})", location, hint), input);
        }
        Dialog::Rename { id, input } => {
            let old = app.store.find(id).map(|n| n.name.as_str()).unwrap_or("");
            draw_prompt(frame, app, " Rename ", &format!("Rename \"{}\" to:", old), input);
        }
        Dialog::ConfirmDelete { id } => {
            let (kind, name) = app
                .store
                .find(id)
                .map(|n| (n.kind.label(), n.name.as_str()))
                .unwrap_or(("File", ""));
            let message = if kind == "Folder" {
                format!("Delete folder \"{}\" and everything in it?", name)
            } else {
                format!("Delete file \"{}\"?", name)
            };
            draw_confirm(frame, app, &message);
        }
    }
}

/// Text prompt with a label line, an input box and a help line
fn draw_prompt(frame: &mut Frame, app: &App, title: &str, label: &str, input: &str) {
    let dialog_area = centered(frame.area(), 50, 8);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_focused))
        .style(Style::default().fg(app.theme.fg).bg(app.theme.popup_bg));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Label
            Constraint::Length(3), // Input with border
            Constraint::Min(0),
            Constraint::Length(1), // Help text
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(label).style(Style::default().fg(app.theme.muted)),
        chunks[0],
    );

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let input_inner = input_block.inner(chunks[1]);
    frame.render_widget(Paragraph::new(input).block(input_block), chunks[1]);
    let cursor_x = input_inner.x + input.chars().count() as u16;
    if cursor_x < input_inner.x + input_inner.width {
        frame.set_cursor_position((cursor_x, input_inner.y));
    }

    frame.render_widget(
        Paragraph::new("Enter:Confirm  Esc:Cancel")
            .style(Style::default().fg(app.theme.line_number))
            .alignment(Alignment::Center),
        chunks[3],
    );
}

fn draw_confirm(frame: &mut Frame, app: &App, message: &str) {
    let dialog_area = centered(frame.area(), 50, 6);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.log_error))
        .style(Style::default().fg(app.theme.fg).bg(app.theme.popup_bg));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter:Delete  n/Esc:Cancel",
            Style::default().fg(app.theme.line_number),
        )),
    ];
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}
