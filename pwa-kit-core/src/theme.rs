//! Light/dark theme decisions.
//!
//! The browser crate reads the body classes, the saved preference and the
//! `prefers-color-scheme` queries, then applies whatever these functions
//! decide.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::{
    THEME_DARK_CLASS, THEME_KEY_SUFFIX, THEME_LIGHT_CLASS, THEME_TOGGLE_SELECTOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// Value persisted under the app's theme key.
    #[must_use]
    pub const fn stored_value(self) -> &'static str {
        match self {
            Self::Dark => "dark-mode",
            Self::Light => "light-mode",
        }
    }

    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "dark-mode" => Some(Self::Dark),
            "light-mode" => Some(Self::Light),
            _ => None,
        }
    }

    #[must_use]
    pub const fn body_class(self) -> &'static str {
        match self {
            Self::Dark => THEME_DARK_CLASS,
            Self::Light => THEME_LIGHT_CLASS,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Checked state of the dark-mode toggles.
    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// Storage key of the saved theme for `app_name`.
#[must_use]
pub fn theme_key(app_name: &str) -> String {
    format!("{app_name}{THEME_KEY_SUFFIX}")
}

/// Results of the two `prefers-color-scheme` media queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemScheme {
    pub prefers_dark: bool,
    pub prefers_light: bool,
}

impl SystemScheme {
    #[must_use]
    pub const fn preferred(self) -> Option<Theme> {
        if self.prefers_dark {
            Some(Theme::Dark)
        } else if self.prefers_light {
            Some(Theme::Light)
        } else {
            None
        }
    }
}

/// Theme-related state of the `<body>` class list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BodyThemeClasses {
    pub dark: bool,
    pub light: bool,
    /// `detect-theme`: follow the system preference.
    pub detect: bool,
    /// Whether the body carries any class at all.
    pub any_class: bool,
}

/// What to do with the page theme at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialTheme {
    /// Saved preference: the body class becomes exactly this theme's class.
    Saved(Theme),
    /// No preference: activate (and persist) the system theme.
    System(Theme),
    Keep,
}

#[must_use]
pub fn initial_theme(
    saved: Option<Theme>,
    body: BodyThemeClasses,
    system: SystemScheme,
) -> InitialTheme {
    if let Some(theme) = saved {
        return InitialTheme::Saved(theme);
    }
    if body.detect || !body.any_class {
        return system
            .preferred()
            .map_or(InitialTheme::Keep, InitialTheme::System);
    }
    InitialTheme::Keep
}

/// Theme a toggle click switches to.
#[must_use]
pub const fn toggle_target(body: BodyThemeClasses, system: SystemScheme) -> Theme {
    if body.light || (body.detect && !system.prefers_dark) {
        Theme::Dark
    } else {
        Theme::Light
    }
}

/// Theme to activate when a `prefers-color-scheme` query for `query_theme`
/// changes. Only a page following the system reacts, and only to a match.
#[must_use]
pub const fn on_scheme_change(
    body: BodyThemeClasses,
    query_theme: Theme,
    matches: bool,
) -> Option<Theme> {
    if body.detect && matches {
        Some(query_theme)
    } else {
        None
    }
}

/// Options accepted by the theme manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default, alias = "pwaName")]
    pub app_name: String,
    #[serde(default = "ThemeConfig::default_toggle_selectors")]
    pub toggle_dark_selectors: String,
}

impl ThemeConfig {
    fn default_toggle_selectors() -> String {
        THEME_TOGGLE_SELECTOR.to_string()
    }

    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            toggle_dark_selectors: Self::default_toggle_selectors(),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAppName`] when no app name was given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        Ok(())
    }

    #[must_use]
    pub fn storage_key(&self) -> String {
        theme_key(&self.app_name)
    }
}
