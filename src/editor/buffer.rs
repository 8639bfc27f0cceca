use super::cursor::Cursor;
use ropey::Rope;

/// Scratch rope over a tab's text, addressed by line and column.
///
/// Edits happen here and the resulting text is written back to the tab.
#[derive(Debug, Clone)]
pub struct Buffer {
    rope: Rope,
}

impl Buffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of lines (an empty buffer has one)
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Line length in characters, without the line break
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Line text without the line break
    pub fn line(&self, line: usize) -> String {
        if line >= self.len_lines() {
            return String::new();
        }
        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }

    /// Leading spaces and tabs of a line
    pub fn indentation(&self, line: usize) -> String {
        self.line(line)
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect()
    }

    /// Clamp a cursor into the buffer
    pub fn clamp(&self, cursor: Cursor) -> Cursor {
        let line = cursor.line.min(self.len_lines().saturating_sub(1));
        let col = cursor.col.min(self.line_len(line));
        Cursor {
            line,
            col,
            wanted_col: cursor.wanted_col,
        }
    }

    fn char_index(&self, at: Cursor) -> usize {
        let at = self.clamp(at);
        self.rope.line_to_char(at.line) + at.col
    }

    fn cursor_at(&self, char_idx: usize) -> Cursor {
        let char_idx = char_idx.min(self.len_chars());
        let line = self.rope.char_to_line(char_idx);
        Cursor::at(line, char_idx - self.rope.line_to_char(line))
    }

    /// Insert text and return the cursor just past it
    pub fn insert(&mut self, at: Cursor, text: &str) -> Cursor {
        let idx = self.char_index(at);
        self.rope.insert(idx, text);
        self.cursor_at(idx + text.chars().count())
    }

    /// Delete the character before the cursor, joining lines at column 0
    pub fn backspace(&mut self, at: Cursor) -> Cursor {
        let idx = self.char_index(at);
        if idx == 0 {
            return self.cursor_at(0);
        }
        self.rope.remove(idx - 1..idx);
        self.cursor_at(idx - 1)
    }

    /// Delete the character under the cursor
    pub fn delete(&mut self, at: Cursor) -> Cursor {
        let idx = self.char_index(at);
        if idx < self.len_chars() {
            self.rope.remove(idx..idx + 1);
        }
        self.cursor_at(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let buf = Buffer::from_text("");
        assert_eq!(buf.len_lines(), 1);
        assert_eq!(buf.line_len(0), 0);
        assert_eq!(buf.line(0), "");
    }

    #[test]
    fn test_line_access() {
        let buf = Buffer::from_text("Hello\nWorld");
        assert_eq!(buf.len_lines(), 2);
        assert_eq!(buf.line(0), "Hello");
        assert_eq!(buf.line_len(0), 5);
        assert_eq!(buf.line(1), "World");
        assert_eq!(buf.line(7), "");
    }

    #[test]
    fn test_insert_returns_cursor_after_text() {
        let mut buf = Buffer::from_text("Hello");
        let cur = buf.insert(Cursor::at(0, 5), "!\nok");
        assert_eq!(buf.text(), "Hello!\nok");
        assert_eq!((cur.line, cur.col), (1, 2));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = Buffer::from_text("ab\ncd");
        let cur = buf.backspace(Cursor::at(1, 0));
        assert_eq!(buf.text(), "abcd");
        assert_eq!((cur.line, cur.col), (0, 2));

        let cur = buf.backspace(Cursor::at(0, 0));
        assert_eq!(buf.text(), "abcd");
        assert_eq!((cur.line, cur.col), (0, 0));
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let mut buf = Buffer::from_text("ab");
        buf.delete(Cursor::at(0, 2));
        assert_eq!(buf.text(), "ab");
        buf.delete(Cursor::at(0, 0));
        assert_eq!(buf.text(), "b");
    }

    #[test]
    fn test_clamp_and_indentation() {
        let buf = Buffer::from_text("  let x;\n");
        let cur = buf.clamp(Cursor::at(9, 40));
        assert_eq!((cur.line, cur.col), (1, 0));
        assert_eq!(buf.indentation(0), "  ");
    }
}
