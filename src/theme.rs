//! Light/dark/system theme for the terminal view.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

/// User-selectable theme mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the terminal's background. (default)
    #[default]
    System,
}

impl ThemeMode {
    pub fn label(self) -> &'static str {
        match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
            ThemeMode::System => "System",
        }
    }

    /// Resolve `System` to a concrete mode from `COLORFGBG` ("fg;bg").
    ///
    /// Backgrounds 7 and 9–15 are light; anything else, including an unset
    /// variable, resolves to dark.
    pub fn resolve(self) -> ThemeMode {
        match self {
            ThemeMode::System => match std::env::var("COLORFGBG") {
                Ok(v) => resolve_colorfgbg(&v),
                Err(_) => ThemeMode::Dark,
            },
            concrete => concrete,
        }
    }
}

fn resolve_colorfgbg(value: &str) -> ThemeMode {
    match value.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()) {
        Some(7) | Some(9..=15) => ThemeMode::Light,
        _ => ThemeMode::Dark,
    }
}

/// ANSI styling derived from a theme mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    mode: ThemeMode,
    color: bool,
}

impl Theme {
    /// Colour is disabled when `NO_COLOR` is set or stdout is not a terminal.
    pub fn detect(mode: ThemeMode) -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        Self::new(mode, color)
    }

    pub fn new(mode: ThemeMode, color: bool) -> Self {
        Self {
            mode: mode.resolve(),
            color,
        }
    }

    /// A theme that never emits escape codes.
    pub fn plain() -> Self {
        Self::new(ThemeMode::Dark, false)
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    pub fn error(&self, s: &str) -> String {
        self.paint("31", s)
    }

    pub fn success(&self, s: &str) -> String {
        self.paint("32", s)
    }

    /// Body text of the extracted-content pane.
    pub fn body(&self, s: &str) -> String {
        match self.mode {
            ThemeMode::Light => self.paint("90", s),
            _ => self.paint("37", s),
        }
    }

    /// Body text of the summary pane, distinct from [`Theme::body`].
    pub fn accent(&self, s: &str) -> String {
        match self.mode {
            ThemeMode::Light => self.paint("34", s),
            _ => self.paint("94", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(ThemeMode::Dark.label(), "Dark");
        assert_eq!(ThemeMode::Light.label(), "Light");
        assert_eq!(ThemeMode::System.label(), "System");
    }

    #[test]
    fn colorfgbg_resolution() {
        assert_eq!(resolve_colorfgbg("0;15"), ThemeMode::Light);
        assert_eq!(resolve_colorfgbg("15;0"), ThemeMode::Dark);
        assert_eq!(resolve_colorfgbg("12;7"), ThemeMode::Light);
        assert_eq!(resolve_colorfgbg("garbage"), ThemeMode::Dark);
    }

    #[test]
    fn plain_theme_emits_no_escapes() {
        let t = Theme::plain();
        assert!(!t.is_colored());
        assert_eq!(t.accent("x"), "x");
        assert_eq!(t.bold("y"), "y");
    }

    #[test]
    fn accent_differs_from_body_when_coloured() {
        let t = Theme::new(ThemeMode::Dark, true);
        assert_ne!(t.accent("x"), t.body("x"));
        assert!(t.accent("x").starts_with("\x1b["));
    }
}
