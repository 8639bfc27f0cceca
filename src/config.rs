use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Tab width in spaces
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
    /// Mark buffers saved as soon as they are edited
    #[serde(default = "default_true")]
    pub auto_save: bool,
    /// Language tag for new scratch buffers
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Show line numbers
    #[serde(default = "default_true")]
    pub show_line_numbers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Theme name, "dark" or "light"
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Sidebar width percentage
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,
    /// Terminal height percentage
    #[serde(default = "default_terminal_height")]
    pub terminal_height: u16,
    /// Animated starfield behind the workspace
    #[serde(default = "default_true")]
    pub starfield: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Number of submitted commands kept for recall
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Evaluation steps before a run is aborted
    #[serde(default = "default_step_budget")]
    pub step_budget: u64,
    /// Wall-clock budget per run
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
    #[serde(default = "default_max_output_lines")]
    pub max_output_lines: usize,
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
}

// Default value helpers
fn default_tab_width() -> usize {
    2
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "javascript".to_string()
}
fn default_theme() -> String {
    "dark".to_string()
}
fn default_sidebar_width() -> u16 {
    22
}
fn default_terminal_height() -> u16 {
    35
}
fn default_history_limit() -> usize {
    50
}
fn default_step_budget() -> u64 {
    1_000_000
}
fn default_time_budget_ms() -> u64 {
    2000
}
fn default_max_output_lines() -> usize {
    1000
}
fn default_max_call_depth() -> usize {
    200
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_width: default_tab_width(),
            auto_save: true,
            default_language: default_language(),
            show_line_numbers: true,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            sidebar_width: default_sidebar_width(),
            terminal_height: default_terminal_height(),
            starfield: true,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            time_budget_ms: default_time_budget_ms(),
            max_output_lines: default_max_output_lines(),
            max_call_depth: default_max_call_depth(),
        }
    }
}

impl ExecutionConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("Ignoring config at {}: {:#}", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Parse a config file; missing keys take their defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Get the path to the config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nebula").join("config.toml"))
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> anyhow::Result<()> {
        match Self::config_path() {
            Some(path) => self.save_to(&path),
            None => anyhow::bail!("no config directory on this platform"),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.editor.tab_width, 2);
        assert_eq!(config.editor.default_language, "javascript");
        assert_eq!(config.ui.theme, "dark");
        assert_eq!(config.terminal.history_limit, 50);
        assert_eq!(config.execution.step_budget, 1_000_000);
        assert_eq!(config.execution.time_budget(), Duration::from_millis(2000));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ui.theme = "light".to_string();
        config.editor.tab_width = 4;
        config.execution.max_call_depth = 64;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui]\ntheme = \"light\"\n\n[execution]\nstep_budget = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.ui.theme, "light");
        assert_eq!(config.ui.sidebar_width, 22);
        assert_eq!(config.execution.step_budget, 10);
        assert_eq!(config.execution.time_budget_ms, 2000);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui\ntheme = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
