use crate::app::App;
use crate::highlighting::{HighlightStyle, StyledSpan};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

/// Draw the code editor pane
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect, focused: bool) {
    let block = Block::default().style(super::surface(app, app.theme.editor_bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Store editor area for mouse handling
    app.areas.editor = Some(inner);

    let theme = app.theme.clone();
    let show_numbers = app.config.editor.show_line_numbers;
    let tab = app.tabs.active();
    let source: Vec<&str> = tab
        .content
        .split('\n')
        .map(|l| l.trim_end_matches('\r'))
        .collect();

    let gutter_width = if show_numbers {
        digits(source.len()) as u16 + 2
    } else {
        1
    };
    app.areas.gutter_width = gutter_width;

    let text_width = inner.width.saturating_sub(gutter_width) as usize;
    let visible_lines = inner.height as usize;
    if text_width == 0 || visible_lines == 0 {
        return;
    }

    app.editor.page_height = visible_lines;
    app.editor
        .scroll_to_cursor(&tab.id, visible_lines, text_width);
    let cursor = app.editor.cursor(&tab.id);
    let view = app.editor.viewport(&tab.id);

    let highlighted = app.highlighting.highlight(
        &tab.content,
        &tab.language,
        theme.syntax_theme,
        view.scroll_y + visible_lines,
    );

    let mut lines: Vec<Line> = Vec::with_capacity(visible_lines);
    for row in 0..visible_lines {
        let line_idx = view.scroll_y + row;
        let Some(content) = source.get(line_idx) else {
            let filler = format!("{:>width$} ", "~", width = gutter_width.saturating_sub(1) as usize);
            lines.push(Line::from(Span::styled(
                if show_numbers { filler } else { String::new() },
                Style::default().fg(theme.line_number),
            )));
            continue;
        };

        let is_current = line_idx == cursor.line;
        let num_style = if is_current {
            Style::default().fg(theme.line_number_current)
        } else {
            Style::default().fg(theme.line_number)
        };
        let number = if show_numbers {
            format!("{:>width$} ", line_idx + 1, width = (gutter_width - 2) as usize + 1)
        } else {
            " ".to_string()
        };

        let pieces: Vec<(String, Style)> = match highlighted.as_ref().and_then(|h| h.get(line_idx)) {
            Some(spans) => spans.iter().map(span_style).collect(),
            None => vec![(content.to_string(), Style::default().fg(theme.fg))],
        };

        let mut spans = vec![Span::styled(number, num_style)];
        spans.extend(clip(&pieces, view.scroll_x, text_width));

        let mut line = Line::from(spans);
        if is_current && focused {
            line = line.style(Style::default().bg(theme.line_highlight));
            // Pad so the highlight spans the whole row
            let used = line.width();
            if used < inner.width as usize {
                line.spans.push(Span::raw(" ".repeat(inner.width as usize - used)));
            }
        }
        lines.push(line);
    }

    frame.render_widget(Paragraph::new(lines), inner);

    if focused && !app.session.has_overlay() {
        let col = cursor.col.saturating_sub(view.scroll_x);
        let row = cursor.line.saturating_sub(view.scroll_y);
        if col < text_width && row < visible_lines {
            frame.set_cursor_position((inner.x + gutter_width + col as u16, inner.y + row as u16));
        }
    }
}

fn span_style(span: &StyledSpan) -> (String, Style) {
    (span.text.clone(), to_style(span.style))
}

fn to_style(hl: HighlightStyle) -> Style {
    let mut style = Style::default();
    if let Some(fg) = hl.fg {
        style = style.fg(fg);
    }
    if hl.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if hl.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if hl.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Cut styled pieces to the `width` characters starting at `skip`
fn clip(pieces: &[(String, Style)], skip: usize, width: usize) -> Vec<Span<'static>> {
    let mut out = Vec::new();
    let mut pos = 0;
    let end = skip + width;
    for (text, style) in pieces {
        let len = text.chars().count();
        let start = pos;
        pos += len;
        if pos <= skip || start >= end {
            continue;
        }
        let from = skip.saturating_sub(start);
        let to = (end - start).min(len);
        let visible: String = text
            .chars()
            .skip(from)
            .take(to - from)
            .map(|c| if c == '\t' { ' ' } else { c })
            .collect();
        out.push(Span::styled(visible, *style));
    }
    out
}

fn digits(n: usize) -> usize {
    n.max(1).to_string().len()
}

/// Map a screen position inside the editor to a (line, column) in the active tab
pub fn position_from_screen(app: &App, x: u16, y: u16) -> Option<(usize, usize)> {
    let area = app.areas.editor?;
    if !super::layout::contains(area, x, y) {
        return None;
    }
    let view = app.editor.viewport(app.tabs.active_id());
    let text_x = area.x + app.areas.gutter_width;
    let col = x.saturating_sub(text_x) as usize + view.scroll_x;
    let line = (y - area.y) as usize + view.scroll_y;
    Some((line, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[Span]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_clip_spans() {
        let red = Style::default().fg(Color::Red);
        let pieces = vec![
            ("const".to_string(), red),
            (" x = ".to_string(), Style::default()),
            ("1;".to_string(), red),
        ];
        assert_eq!(texts(&clip(&pieces, 0, 100)), vec!["const", " x = ", "1;"]);
        assert_eq!(texts(&clip(&pieces, 3, 4)), vec!["st", " x"]);
        assert!(clip(&pieces, 20, 5).is_empty());
    }

    #[test]
    fn test_gutter_digits() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(1234), 4);
    }
}
