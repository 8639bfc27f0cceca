use anyhow::Result;
use app::App;
use config::Config;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};

mod animation;
mod app;
mod commands;
mod config;
mod editor;
mod error;
mod exec;
mod file_tree;
mod highlighting;
mod input;
mod language;
mod notify;
mod session;
mod terminal;
mod theme;
mod ui;
mod utils;

/// Raw mode, alternate screen and mouse capture for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(stdout(), EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort: try every step even if one fails
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; redirect it to keep them off the screen
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::load();
    let mut app = App::new(config);

    let result = {
        let _guard = TerminalGuard::new()?;
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;
        let result = app.run(&mut terminal);
        let _ = terminal.show_cursor();
        result
    };

    // Handle any errors from the app
    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
