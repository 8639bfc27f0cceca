use super::buffer::Buffer;

/// Cursor position in a tab's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Line number (0-based)
    pub line: usize,
    /// Column number (0-based, in characters)
    pub col: usize,
    /// Column to return to when moving through shorter lines
    pub wanted_col: usize,
}

impl Cursor {
    pub fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            wanted_col: col,
        }
    }

    pub fn left(&mut self, buf: &Buffer) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.line > 0 {
            self.line -= 1;
            self.col = buf.line_len(self.line);
        }
        self.wanted_col = self.col;
    }

    pub fn right(&mut self, buf: &Buffer) {
        if self.col < buf.line_len(self.line) {
            self.col += 1;
        } else if self.line + 1 < buf.len_lines() {
            self.line += 1;
            self.col = 0;
        }
        self.wanted_col = self.col;
    }

    pub fn up(&mut self, buf: &Buffer, lines: usize) {
        self.line = self.line.saturating_sub(lines);
        self.col = self.wanted_col.min(buf.line_len(self.line));
    }

    pub fn down(&mut self, buf: &Buffer, lines: usize) {
        let last = buf.len_lines().saturating_sub(1);
        self.line = (self.line + lines).min(last);
        self.col = self.wanted_col.min(buf.line_len(self.line));
    }

    pub fn home(&mut self) {
        self.col = 0;
        self.wanted_col = 0;
    }

    pub fn end(&mut self, buf: &Buffer) {
        self.col = buf.line_len(self.line);
        self.wanted_col = self.col;
    }

    pub fn top(&mut self) {
        *self = Self::default();
    }

    pub fn bottom(&mut self, buf: &Buffer) {
        let last = buf.len_lines().saturating_sub(1);
        *self = Self::at(last, buf.line_len(last));
    }
}

/// Scroll position of the editor surface for one tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub scroll_y: usize,
    pub scroll_x: usize,
}

impl Viewport {
    /// Scroll so the cursor is inside a `height` x `width` window
    pub fn follow(&mut self, cursor: Cursor, height: usize, width: usize) {
        if height > 0 {
            if cursor.line < self.scroll_y {
                self.scroll_y = cursor.line;
            } else if cursor.line >= self.scroll_y + height {
                self.scroll_y = cursor.line + 1 - height;
            }
        }
        if width > 0 {
            if cursor.col < self.scroll_x {
                self.scroll_x = cursor.col;
            } else if cursor.col >= self.scroll_x + width {
                self.scroll_x = cursor.col + 1 - width;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wanted_col_survives_short_lines() {
        let buf = Buffer::from_text("long line\nab\nanother long");
        let mut cur = Cursor::at(0, 8);
        cur.down(&buf, 1);
        assert_eq!((cur.line, cur.col), (1, 2));
        cur.down(&buf, 1);
        assert_eq!((cur.line, cur.col), (2, 8));
    }

    #[test]
    fn test_left_right_wrap_lines() {
        let buf = Buffer::from_text("ab\ncd");
        let mut cur = Cursor::at(0, 2);
        cur.right(&buf);
        assert_eq!((cur.line, cur.col), (1, 0));
        cur.left(&buf);
        assert_eq!((cur.line, cur.col), (0, 2));
    }

    #[test]
    fn test_bounds() {
        let buf = Buffer::from_text("a\nb\nc");
        let mut cur = Cursor::default();
        cur.up(&buf, 5);
        assert_eq!(cur.line, 0);
        cur.down(&buf, 50);
        assert_eq!(cur.line, 2);
        cur.bottom(&buf);
        assert_eq!((cur.line, cur.col), (2, 1));
        cur.top();
        assert_eq!(cur, Cursor::default());
    }

    #[test]
    fn test_viewport_follows_cursor() {
        let mut view = Viewport::default();
        view.follow(Cursor::at(30, 0), 10, 80);
        assert_eq!(view.scroll_y, 21);
        view.follow(Cursor::at(5, 100), 10, 80);
        assert_eq!(view.scroll_y, 5);
        assert_eq!(view.scroll_x, 21);
    }
}
