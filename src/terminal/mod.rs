//! Simulated terminal: an append-only log, a fixed command grammar and a
//! bounded command history.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

pub const BANNER: &str = "NebulaCode Studio Terminal v1.0.0";
pub const HINT: &str = "Type \"help\" for available commands";
pub const CLEARED: &str = "Terminal cleared";
pub const EXECUTING: &str = "Executing code...";
/// Most commands kept for up/down recall
pub const MAX_HISTORY: usize = 50;
pub const HELP: &str = "Available commands:\n\
- clear/cls: Clear the terminal\n\
- help: Show this help message\n\
- version: Show terminal version\n\
- echo [text]: Print text\n\
- time: Show current time";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Success,
    /// Echo of a submitted command line
    Command,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: u64,
    pub kind: LogKind,
    pub text: String,
    pub created_at: DateTime<Local>,
}

/// Terminal log plus the input line
pub struct Console {
    entries: Vec<LogEntry>,
    next_id: u64,
    /// Most recent first
    history: VecDeque<String>,
    history_limit: usize,
    /// Position in `history` while recalling with up/down
    history_cursor: Option<usize>,
    input: String,
    /// Scroll offset in lines (0 = at bottom/current, positive = scrolled up)
    pub scroll_offset: usize,
}

impl Console {
    pub fn new(history_limit: usize) -> Self {
        let mut console = Self {
            entries: Vec::new(),
            next_id: 0,
            history: VecDeque::new(),
            history_limit: history_limit.clamp(1, MAX_HISTORY),
            history_cursor: None,
            input: String::new(),
            scroll_offset: 0,
        };
        console.push(LogKind::Info, BANNER);
        console.push(LogKind::Info, HINT);
        console
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push(&mut self, kind: LogKind, text: impl Into<String>) {
        self.entries.push(LogEntry {
            id: self.next_id,
            kind,
            text: text.into(),
            created_at: Local::now(),
        });
        self.next_id += 1;
        self.scroll_to_bottom();
    }

    /// Replace the log with a single reset entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.push(LogKind::Info, CLEARED);
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Submit the input line. Returns false when it was blank.
    pub fn submit(&mut self) -> bool {
        let line = std::mem::take(&mut self.input);
        self.process(&line)
    }

    /// Record `line` in the log and history, then run it
    pub fn process(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }

        self.push(LogKind::Command, format!("$ {}", line));
        self.history.push_front(line.to_string());
        self.history.truncate(self.history_limit);
        self.history_cursor = None;

        let trimmed = line.trim();
        let command = trimmed.to_lowercase();
        match command.as_str() {
            "clear" | "cls" => self.clear(),
            "help" => self.push(LogKind::Info, HELP),
            "version" => self.push(LogKind::Info, BANNER),
            "time" => {
                let now = Local::now().format("%Y-%m-%d %H:%M:%S");
                self.push(LogKind::Info, format!("Current time: {}", now));
            }
            _ if command.starts_with("echo ") => {
                let text = trimmed.get(5..).unwrap_or_default().to_string();
                self.push(LogKind::Info, text);
            }
            _ => {
                log::debug!("Unknown terminal command: {}", trimmed);
                self.push(LogKind::Error, format!("Command not found: {}", line));
            }
        }
        true
    }

    /// Recall an older command; stops at the oldest
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_cursor {
            None => 0,
            Some(i) => (i + 1).min(self.history.len() - 1),
        };
        self.history_cursor = Some(next);
        self.input = self.history[next].clone();
    }

    /// Recall a newer command; past the newest the input is cleared
    pub fn history_down(&mut self) {
        match self.history_cursor {
            Some(0) => {
                self.history_cursor = None;
                self.input.clear();
            }
            Some(i) => {
                self.history_cursor = Some(i - 1);
                self.input = self.history[i - 1].clone();
            }
            None => {}
        }
    }

    /// Append the result of a code run
    pub fn append_execution(&mut self, output: &str) {
        self.push(LogKind::Info, EXECUTING);
        self.push(LogKind::Success, output);
    }

    /// Log rendered as `[HH:MM:SS] text` lines
    pub fn copy_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("[{}] {}", entry.created_at.format("%H:%M:%S"), entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rendered line count of the whole log
    pub fn line_count(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.text.lines().count().max(1))
            .sum()
    }

    /// Scroll up in the log
    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.line_count().saturating_sub(1));
    }

    /// Scroll down in the log
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scroll to the bottom (most recent output)
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(console: &Console) -> Vec<&str> {
        console.entries().iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_initial_entries() {
        let console = Console::new(50);
        assert_eq!(texts(&console), vec![BANNER, HINT]);
        assert!(console.entries().iter().all(|e| e.kind == LogKind::Info));
    }

    #[test]
    fn test_known_commands() {
        let mut console = Console::new(50);
        console.process("HELP");
        console.process("version");
        console.process("  echo Hello World  ");

        let entries = console.entries();
        assert_eq!(entries[2].kind, LogKind::Command);
        assert_eq!(entries[2].text, "$ HELP");
        assert_eq!(entries[3].text, HELP);
        assert_eq!(entries[5].text, BANNER);
        assert_eq!(entries[7].text, "Hello World");
        assert_eq!(entries[7].kind, LogKind::Info);
    }

    #[test]
    fn test_time() {
        let mut console = Console::new(50);
        console.process("time");
        let last = console.entries().last().unwrap();
        assert!(last.text.starts_with("Current time: "));
    }

    #[test]
    fn test_unknown_command() {
        let mut console = Console::new(50);
        console.process("rm -rf /");
        let last = console.entries().last().unwrap();
        assert_eq!(last.kind, LogKind::Error);
        assert_eq!(last.text, "Command not found: rm -rf /");

        // `echo` with no text is not the echo command
        console.process("echo");
        assert_eq!(console.entries().last().unwrap().text, "Command not found: echo");
    }

    #[test]
    fn test_clear() {
        let mut console = Console::new(50);
        console.process("help");
        console.process("cls");
        assert_eq!(texts(&console), vec![CLEARED]);
        assert_eq!(console.history().collect::<Vec<_>>(), vec!["cls", "help"]);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut console = Console::new(50);
        assert!(!console.process("   "));
        assert_eq!(console.entries().len(), 2);
        assert_eq!(console.history().count(), 0);
    }

    #[test]
    fn test_history_is_capped() {
        let mut console = Console::new(50);
        for i in 0..60 {
            console.process(&format!("echo {}", i));
        }
        let history: Vec<_> = console.history().collect();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0], "echo 59");
        assert_eq!(history[49], "echo 10");
    }

    #[test]
    fn test_history_limit_is_clamped() {
        let mut console = Console::new(500);
        for i in 0..80 {
            console.process(&format!("echo {}", i));
        }
        assert_eq!(console.history().count(), MAX_HISTORY);

        let mut console = Console::new(0);
        console.process("help");
        console.process("version");
        assert_eq!(console.history().collect::<Vec<_>>(), vec!["version"]);
    }

    #[test]
    fn test_history_recall() {
        let mut console = Console::new(50);
        console.history_up();
        assert_eq!(console.input(), "");

        for line in ["one", "two", "three"] {
            console.push_char(' ');
            console.backspace();
            for c in line.chars() {
                console.push_char(c);
            }
            assert!(console.submit());
        }
        assert_eq!(console.input(), "");

        console.history_up();
        assert_eq!(console.input(), "three");
        console.history_up();
        console.history_up();
        console.history_up();
        assert_eq!(console.input(), "one");

        console.history_down();
        assert_eq!(console.input(), "two");
        console.history_down();
        console.history_down();
        assert_eq!(console.input(), "");
        console.history_down();
        assert_eq!(console.input(), "");

        console.history_up();
        console.submit();
        console.history_up();
        assert_eq!(console.input(), "three");
    }

    #[test]
    fn test_append_execution() {
        let mut console = Console::new(50);
        console.append_execution("2");
        let entries = console.entries();
        assert_eq!(entries[2].kind, LogKind::Info);
        assert_eq!(entries[2].text, EXECUTING);
        assert_eq!(entries[3].kind, LogKind::Success);
        assert_eq!(entries[3].text, "2");
    }

    #[test]
    fn test_copy_text() {
        let console = Console::new(50);
        let text = console.copy_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert_eq!(&lines[0][9..], "] NebulaCode Studio Terminal v1.0.0");
    }

    #[test]
    fn test_scrolling() {
        let mut console = Console::new(50);
        console.process("help");
        assert_eq!(console.line_count(), 2 + 1 + 6);

        console.scroll_up(3);
        assert_eq!(console.scroll_offset, 3);
        console.scroll_up(100);
        assert_eq!(console.scroll_offset, 8);
        console.scroll_down(5);
        assert_eq!(console.scroll_offset, 3);

        console.process("version");
        assert_eq!(console.scroll_offset, 0);
    }
}
