use crate::app::App;
use crate::file_tree::NodeKind;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::layout::Hit;

/// Draw the explorer sidebar
pub fn draw(frame: &mut Frame, app: &mut App, area: Rect, focused: bool) {
    let border_color = if focused {
        app.theme.border_focused
    } else {
        app.theme.border
    };

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(border_color))
        .style(super::surface(app, app.theme.sidebar_bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // Header with the root-level create buttons
    let header_area = Rect::new(inner.x, inner.y, inner.width, 1);
    frame.render_widget(
        Paragraph::new(" EXPLORER").style(
            Style::default()
                .fg(app.theme.muted)
                .add_modifier(Modifier::BOLD),
        ),
        header_area,
    );
    let buttons = [(" +F ", NodeKind::File), (" +D ", NodeKind::Folder)];
    let mut x = inner.x + inner.width;
    for (label, kind) in buttons.iter().rev() {
        let width = label.width() as u16;
        if x < inner.x + width + 9 {
            break;
        }
        x -= width;
        let rect = Rect::new(x, inner.y, width, 1);
        frame.render_widget(
            Paragraph::new(*label).style(Style::default().fg(app.theme.accent)),
            rect,
        );
        app.areas.push(rect, Hit::TreeRoot(*kind));
    }

    if inner.height < 2 {
        return;
    }
    let content_area = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);
    app.areas.file_tree = Some(content_area);

    let visible_height = content_area.height as usize;
    app.tree.ensure_visible_with_height(visible_height);

    let max_width = content_area.width as usize;
    let mut lines: Vec<Line> = Vec::new();

    for i in 0..visible_height {
        let row_idx = app.tree.scroll_offset + i;
        let Some(row) = app.tree.rows.get(row_idx) else {
            break;
        };
        let is_selected = row_idx == app.tree.selected;
        let is_marked = app.tree.marked.as_ref() == Some(&row.id);
        let is_open = app.tabs.active_id() == row.id.as_str();

        let indent = "  ".repeat(row.depth);
        let icon = match row.kind {
            NodeKind::Folder if row.expanded => "▾ ",
            NodeKind::Folder => "▸ ",
            NodeKind::File => "  ",
        };
        let marker = if is_marked { "» " } else { "" };
        let prefix = format!("{}{}{}", indent, icon, marker);

        let available = max_width.saturating_sub(prefix.width());
        let name = truncate(&row.name, available);

        let mut style = Style::default().fg(match row.kind {
            NodeKind::Folder => app.theme.tree_dir,
            NodeKind::File => app.theme.tree_file,
        });
        if is_selected && focused {
            style = style.bg(app.theme.tree_selected_bg).add_modifier(Modifier::BOLD);
        } else if is_selected {
            style = style.bg(app.theme.line_highlight);
        }
        if is_open {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        let text = format!("{}{}", prefix, name);
        let text = if is_selected {
            // Fill the row so the selection bar spans the sidebar
            format!("{:<width$}", text, width = max_width)
        } else {
            text
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    frame.render_widget(Paragraph::new(lines), content_area);
}

/// Cut `name` to `width` columns, ending with an ellipsis when shortened
fn truncate(name: &str, width: usize) -> String {
    if name.width() <= width {
        return name.to_string();
    }
    let mut out = String::new();
    for c in name.chars() {
        if out.width() + 2 > width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

/// Get the tree row index at a given screen position
pub fn row_at_position(app: &App, x: u16, y: u16) -> Option<usize> {
    let area = app.areas.file_tree?;
    if !super::layout::contains(area, x, y) {
        return None;
    }
    app.tree.index_at_row((y - area.y) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("index.js", 10), "index.js");
        assert_eq!(truncate("components", 6), "compo…");
        assert_eq!(truncate("abc", 0), "…");
    }
}
