//! Shared constants for the DOM contract, persisted keys and timers.

/// Milliseconds in one reminder day.
pub const DAY_MS: i64 = 86_400_000;

/// Delay before a custom install prompt is shown on either platform.
pub const PROMPT_DELAY_MS: u32 = 3_500;

/// Class that marks a prompt surface or the menu hider as visible.
pub const ACTIVE_CLASS: &str = "menu-active";

/// Root-element class set once the install coordinator has run for the page.
pub const INIT_MARKER_CLASS: &str = "isPWA";

/// Persisted prompt state after the user declined installation.
pub const INSTALL_REJECTED: &str = "install-rejected";

/// Media query for an installed/fullscreen display mode.
pub const FULLSCREEN_QUERY: &str = "(display-mode: fullscreen)";

pub const TIMEOUT_KEY_SUFFIX: &str = "-PWA-Timeout-Value";
pub const PROMPT_KEY_SUFFIX: &str = "-PWA-Prompt";
pub const THEME_KEY_SUFFIX: &str = "-Theme";

// Preloader
pub const PRELOADER_DELAY_MS: u32 = 150;
pub const PRELOADER_ID: &str = "preloader";
pub const PRELOADER_HIDE_CLASS: &str = "preloader-hide";

// Theme manager
pub const THEME_DARK_CLASS: &str = "theme-dark";
pub const THEME_LIGHT_CLASS: &str = "theme-light";
pub const THEME_DETECT_CLASS: &str = "detect-theme";
pub const THEME_TOGGLE_SELECTOR: &str = "[data-toggle-theme]";
pub const THEME_DETECT_BUTTON_SELECTOR: &str = ".detect-dark-mode";
pub const THEME_TRANSITION_SELECTOR: &str = ".btn, .header, #footer-bar, .menu-box, .menu-active";
pub const THEME_TRANSITION_RESTORE_MS: u32 = 350;
pub const THEME_DETECT_DELAY_MS: u32 = 50;
pub const PREFERS_DARK_QUERY: &str = "(prefers-color-scheme: dark)";
pub const PREFERS_LIGHT_QUERY: &str = "(prefers-color-scheme: light)";
