#![forbid(unsafe_code)]
//! Browser bindings for pwa-kit.
//!
//! Exposes `initPWA`, `initPreloader`, `initThemeManager` and the
//! `cacheManager` helpers to JavaScript.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod cache;
pub mod dom;
pub mod host;
pub mod install;
pub mod preloader;
pub mod theme;

pub use host::BrowserHost;
pub use install::{NativeInstallPrompt, PromptError, start_install_prompts};
pub use theme::start_theme_manager;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A second module instance on the page already owns the logger.
    let _ = console_log::init_with_level(log::Level::Info);
}
