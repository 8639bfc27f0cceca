use crate::session::ThemeMode;
use ratatui::style::Color;

/// Color theme for the application
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Background color for the main UI, also the space behind the stars
    pub bg: Color,
    /// Foreground (text) color
    pub fg: Color,
    /// Dimmed text (hints, timestamps)
    pub muted: Color,
    /// Brand color used for the logo, focus and highlights
    pub accent: Color,
    /// Secondary brand color
    pub accent_alt: Color,
    /// Background for the sidebar/file tree
    pub sidebar_bg: Color,
    /// Background for the editor
    pub editor_bg: Color,
    /// Background for the terminal
    pub terminal_bg: Color,
    /// Background for the status bar
    pub statusbar_bg: Color,
    /// Foreground for the status bar
    pub statusbar_fg: Color,
    /// Background for the navbar
    pub navbar_bg: Color,
    /// Active tab background
    pub tab_active_bg: Color,
    /// Active tab foreground
    pub tab_active_fg: Color,
    /// Inactive tab background
    pub tab_inactive_bg: Color,
    /// Inactive tab foreground
    pub tab_inactive_fg: Color,
    /// Border color
    pub border: Color,
    /// Border color for focused pane
    pub border_focused: Color,
    /// Background of popups (palette, settings, dialogs)
    pub popup_bg: Color,
    /// Line number color
    pub line_number: Color,
    /// Current line number color
    pub line_number_current: Color,
    /// Current line highlight
    pub line_highlight: Color,
    /// Directory color in file tree
    pub tree_dir: Color,
    /// File color in file tree
    pub tree_file: Color,
    /// Selected item in file tree
    pub tree_selected_bg: Color,
    /// Terminal entry colors
    pub log_info: Color,
    pub log_warning: Color,
    pub log_error: Color,
    pub log_success: Color,
    pub log_command: Color,
    /// Bright and faint star colors
    pub star: Color,
    pub star_glow: Color,
    /// Name of the syntect theme used for code
    pub syntax_theme: &'static str,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Deep-space dark theme
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 25),
            fg: Color::Rgb(226, 226, 240),
            muted: Color::Rgb(130, 130, 160),
            accent: Color::Rgb(155, 135, 245),
            accent_alt: Color::Rgb(30, 174, 219),
            sidebar_bg: Color::Rgb(16, 16, 36),
            editor_bg: Color::Rgb(13, 13, 30),
            terminal_bg: Color::Rgb(8, 8, 20),
            statusbar_bg: Color::Rgb(110, 89, 165),
            statusbar_fg: Color::Rgb(255, 255, 255),
            navbar_bg: Color::Rgb(20, 20, 44),
            tab_active_bg: Color::Rgb(13, 13, 30),
            tab_active_fg: Color::Rgb(255, 255, 255),
            tab_inactive_bg: Color::Rgb(24, 24, 50),
            tab_inactive_fg: Color::Rgb(140, 140, 170),
            border: Color::Rgb(50, 50, 85),
            border_focused: Color::Rgb(155, 135, 245),
            popup_bg: Color::Rgb(26, 26, 54),
            line_number: Color::Rgb(90, 90, 125),
            line_number_current: Color::Rgb(200, 200, 230),
            line_highlight: Color::Rgb(24, 24, 48),
            tree_dir: Color::Rgb(155, 135, 245),
            tree_file: Color::Rgb(214, 214, 230),
            tree_selected_bg: Color::Rgb(44, 40, 82),
            log_info: Color::Rgb(226, 226, 240),
            log_warning: Color::Rgb(250, 204, 21),
            log_error: Color::Rgb(248, 113, 113),
            log_success: Color::Rgb(74, 222, 128),
            log_command: Color::Rgb(155, 135, 245),
            star: Color::Rgb(255, 255, 255),
            star_glow: Color::Rgb(155, 135, 245),
            syntax_theme: "base16-ocean.dark",
        }
    }

    /// Light theme, stars become faint dots
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(244, 244, 250),
            fg: Color::Rgb(30, 30, 46),
            muted: Color::Rgb(110, 110, 130),
            accent: Color::Rgb(110, 89, 165),
            accent_alt: Color::Rgb(14, 116, 144),
            sidebar_bg: Color::Rgb(234, 234, 244),
            editor_bg: Color::Rgb(255, 255, 255),
            terminal_bg: Color::Rgb(238, 238, 246),
            statusbar_bg: Color::Rgb(110, 89, 165),
            statusbar_fg: Color::Rgb(255, 255, 255),
            navbar_bg: Color::Rgb(228, 228, 240),
            tab_active_bg: Color::Rgb(255, 255, 255),
            tab_active_fg: Color::Rgb(30, 30, 46),
            tab_inactive_bg: Color::Rgb(228, 228, 240),
            tab_inactive_fg: Color::Rgb(110, 110, 130),
            border: Color::Rgb(200, 200, 218),
            border_focused: Color::Rgb(110, 89, 165),
            popup_bg: Color::Rgb(250, 250, 255),
            line_number: Color::Rgb(160, 160, 180),
            line_number_current: Color::Rgb(60, 60, 80),
            line_highlight: Color::Rgb(240, 238, 252),
            tree_dir: Color::Rgb(110, 89, 165),
            tree_file: Color::Rgb(40, 40, 56),
            tree_selected_bg: Color::Rgb(222, 216, 246),
            log_info: Color::Rgb(30, 30, 46),
            log_warning: Color::Rgb(161, 98, 7),
            log_error: Color::Rgb(185, 28, 28),
            log_success: Color::Rgb(21, 128, 61),
            log_command: Color::Rgb(110, 89, 165),
            star: Color::Rgb(170, 160, 210),
            star_glow: Color::Rgb(210, 204, 236),
            syntax_theme: "InspiredGitHub",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mode() {
        assert_eq!(Theme::for_mode(ThemeMode::Dark), Theme::dark());
        assert_eq!(Theme::for_mode(ThemeMode::Light).syntax_theme, "InspiredGitHub");
    }
}
