use super::buffer::Buffer;
use super::cursor::{Cursor, Viewport};
use super::format::reindent;
use super::tabs::TabSet;
use crate::error::Result;
use std::collections::HashMap;

/// Cursor movement on the active tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// Per-tab cursor and scroll position.
///
/// Text edits are applied to a scratch [`Buffer`] and written back through
/// [`TabSet::edit`], which stays the only mutator of tab content.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    cursors: HashMap<String, Cursor>,
    viewports: HashMap<String, Viewport>,
    /// Visible text rows, updated by the renderer
    pub page_height: usize,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self, tab_id: &str) -> Cursor {
        self.cursors.get(tab_id).copied().unwrap_or_default()
    }

    pub fn viewport(&self, tab_id: &str) -> Viewport {
        self.viewports.get(tab_id).copied().unwrap_or_default()
    }

    /// Keep the active cursor inside a `height` x `width` text area
    pub fn scroll_to_cursor(&mut self, tab_id: &str, height: usize, width: usize) {
        let cursor = self.cursor(tab_id);
        self.viewports
            .entry(tab_id.to_string())
            .or_default()
            .follow(cursor, height, width);
    }

    /// Forget positions for tabs that are no longer open
    pub fn retain_open(&mut self, tabs: &TabSet) {
        self.cursors.retain(|id, _| tabs.contains(id));
        self.viewports.retain(|id, _| tabs.contains(id));
    }

    /// Place the cursor from a click inside the text area
    pub fn click(&mut self, tabs: &TabSet, line: usize, col: usize) {
        let tab = tabs.active();
        let buf = Buffer::from_text(&tab.content);
        let cursor = buf.clamp(Cursor::at(line, col));
        self.cursors.insert(tab.id.clone(), Cursor::at(cursor.line, cursor.col));
    }

    pub fn apply_motion(&mut self, tabs: &TabSet, motion: Motion) {
        let tab = tabs.active();
        let buf = Buffer::from_text(&tab.content);
        let mut cursor = buf.clamp(self.cursor(&tab.id));
        let page = self.page_height.max(1);

        match motion {
            Motion::Left => cursor.left(&buf),
            Motion::Right => cursor.right(&buf),
            Motion::Up => cursor.up(&buf, 1),
            Motion::Down => cursor.down(&buf, 1),
            Motion::Home => cursor.home(),
            Motion::End => cursor.end(&buf),
            Motion::PageUp => cursor.up(&buf, page),
            Motion::PageDown => cursor.down(&buf, page),
            Motion::Top => cursor.top(),
            Motion::Bottom => cursor.bottom(&buf),
        }
        self.cursors.insert(tab.id.clone(), cursor);
    }

    /// Insert text at the cursor
    pub fn insert(&mut self, tabs: &mut TabSet, text: &str) -> Result<()> {
        self.modify(tabs, |buf, cursor| buf.insert(cursor, text))
    }

    /// Break the line, carrying over the current indentation
    pub fn newline(&mut self, tabs: &mut TabSet) -> Result<()> {
        self.modify(tabs, |buf, cursor| {
            let indent = buf.indentation(cursor.line);
            buf.insert(cursor, &format!("\n{}", indent))
        })
    }

    /// Insert spaces up to the next tab stop
    pub fn indent(&mut self, tabs: &mut TabSet, tab_width: usize) -> Result<()> {
        let width = tab_width.max(1);
        self.modify(tabs, |buf, cursor| {
            let spaces = width - cursor.col % width;
            buf.insert(cursor, &" ".repeat(spaces))
        })
    }

    pub fn backspace(&mut self, tabs: &mut TabSet) -> Result<()> {
        self.modify(tabs, |buf, cursor| buf.backspace(cursor))
    }

    pub fn delete(&mut self, tabs: &mut TabSet) -> Result<()> {
        self.modify(tabs, |buf, cursor| buf.delete(cursor))
    }

    /// Re-indent the active tab, keeping the cursor on its line
    pub fn format(&mut self, tabs: &mut TabSet, tab_width: usize) -> Result<()> {
        let id = tabs.active_id().to_string();
        let formatted = reindent(&tabs.active().content, tab_width);
        let buf = Buffer::from_text(&formatted);
        let cursor = buf.clamp(self.cursor(&id));
        tabs.edit(&id, formatted)?;
        self.cursors.insert(id, cursor);
        Ok(())
    }

    fn modify<F>(&mut self, tabs: &mut TabSet, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Buffer, Cursor) -> Cursor,
    {
        let id = tabs.active_id().to_string();
        let mut buf = Buffer::from_text(&tabs.active().content);
        let cursor = buf.clamp(self.cursor(&id));

        let cursor = edit(&mut buf, cursor);
        tabs.edit(&id, buf.text())?;
        self.cursors.insert(id, cursor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (TabSet, EditorState, String) {
        let mut tabs = TabSet::new();
        let id = tabs.open_scratch("javascript");
        (tabs, EditorState::new(), id)
    }

    #[test]
    fn test_typing_goes_through_tabset() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "let").unwrap();
        state.insert(&mut tabs, " x").unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "let x");
        assert_eq!(state.cursor(&id).col, 5);
        assert!(tabs.get(&id).unwrap().modified);
    }

    #[test]
    fn test_newline_keeps_indent() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "if (x) {").unwrap();
        state.newline(&mut tabs).unwrap();
        state.indent(&mut tabs, 2).unwrap();
        state.insert(&mut tabs, "y();").unwrap();
        state.newline(&mut tabs).unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "if (x) {\n  y();\n  ");
        assert_eq!(state.cursor(&id), Cursor::at(2, 2));
    }

    #[test]
    fn test_backspace_and_delete() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "abc").unwrap();
        state.backspace(&mut tabs).unwrap();
        state.apply_motion(&tabs, Motion::Home);
        state.delete(&mut tabs).unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "b");
    }

    #[test]
    fn test_cursors_are_per_tab() {
        let (mut tabs, mut state, first) = scratch();
        state.insert(&mut tabs, "hello").unwrap();
        let second = tabs.open_scratch("javascript");
        assert_eq!(state.cursor(&second), Cursor::default());
        tabs.activate(&first).unwrap();
        assert_eq!(state.cursor(&first).col, 5);
    }

    #[test]
    fn test_stale_cursor_is_clamped() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "hello world").unwrap();
        tabs.edit(&id, "hi").unwrap();
        state.insert(&mut tabs, "!").unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "hi!");
    }

    #[test]
    fn test_retain_open_drops_closed_tabs() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "x").unwrap();
        tabs.close(&id).unwrap();
        state.retain_open(&tabs);
        assert_eq!(state.cursor(&id), Cursor::default());
    }

    #[test]
    fn test_format_active_tab() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "if (a) {\n        b();\n}").unwrap();
        state.format(&mut tabs, 4).unwrap();
        assert_eq!(tabs.get(&id).unwrap().content, "if (a) {\n    b();\n}");
        assert_eq!(state.cursor(&id), Cursor::at(2, 1));
    }

    #[test]
    fn test_click_clamps() {
        let (mut tabs, mut state, id) = scratch();
        state.insert(&mut tabs, "ab\ncd").unwrap();
        state.click(&tabs, 0, 10);
        assert_eq!(state.cursor(&id), Cursor::at(0, 2));
    }
}
