use crate::app::App;
use ratatui::{layout::Position, prelude::*};

/// Paint the starfield across `area`
pub fn draw(frame: &mut Frame, app: &App, area: Rect) {
    let buf = frame.buffer_mut();
    buf.set_style(area, Style::default().bg(app.theme.bg));

    for star in app.starfield.project(area.width, area.height) {
        let glyph = match star.brightness {
            b if b > 0.75 => "✦",
            b if b > 0.45 => "*",
            b if b > 0.2 => "·",
            b if b > 0.05 => ".",
            _ => continue,
        };
        let color = if star.glow { app.theme.star_glow } else { app.theme.star };
        let position = Position::new(area.x + star.col, area.y + star.row);
        if let Some(cell) = buf.cell_mut(position) {
            cell.set_symbol(glyph).set_fg(color);
        }
    }
}
