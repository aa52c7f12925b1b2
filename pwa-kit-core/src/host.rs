//! Seams between the coordinator logic and the browser.
//!
//! Platform-specific crates implement these traits on top of the real
//! browser APIs; `testing::MemoryHost` (behind the `testing`
//! feature) implements them in memory.

use thiserror::Error;

use crate::platform::Platform;

/// Failures reported by a host capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{0} is not available in this browser")]
    Unsupported(&'static str),
    #[error("{operation} failed: {message}")]
    Failed {
        operation: &'static str,
        message: String,
    },
}

impl HostError {
    pub fn failed(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            operation,
            message: message.into(),
        }
    }
}

/// Durable, browser-scoped key/value storage (`localStorage`).
pub trait KeyValueStore {
    /// # Errors
    ///
    /// Returns an error if the storage backend is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>, HostError>;

    /// # Errors
    ///
    /// Returns an error if the storage backend is unavailable or rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), HostError>;

    /// # Errors
    ///
    /// Returns an error if the storage backend is unavailable.
    fn remove(&self, key: &str) -> Result<(), HostError>;
}

/// Wall-clock source in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Minimal DOM access used by the prompt surfaces.
pub trait DomSurface {
    /// Whether any element matches `selector`.
    fn exists(&self, selector: &str) -> bool;

    /// Add or remove `class` on the first element matching `selector`.
    /// Returns `false` when nothing matched.
    fn set_class(&self, selector: &str, class: &str, on: bool) -> bool;

    fn root_has_class(&self, class: &str) -> bool;

    fn set_root_class(&self, class: &str, on: bool);

    /// Evaluate a media query.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unsupported`] when `matchMedia` is missing.
    fn media_matches(&self, query: &str) -> Result<bool, HostError>;
}

/// Facts about the browser used for platform detection.
pub trait BrowserProbe {
    fn user_agent(&self) -> Option<String>;

    /// Whether the browser exposes a native install-eligibility event.
    /// `None` when the host cannot tell.
    fn supports_install_prompt(&self) -> Option<bool>;
}

/// Event and timer wiring performed during initialization.
///
/// Implementations route the resulting callbacks back into the owning
/// [`crate::InstallPromptCoordinator`].
pub trait InstallWiring {
    /// Register the service worker once the page has loaded, then ask it to update.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unsupported`] when service workers are unavailable.
    fn register_service_worker_on_load(&self, url: &str, scope: &str) -> Result<(), HostError>;

    /// Attach dismissal click handlers; returns the number of buttons wired.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be queried.
    fn wire_dismiss_buttons(&self, selector: &str) -> Result<usize, HostError>;

    /// Start listening for the native install-eligibility signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be attached.
    fn listen_for_install_signal(&self) -> Result<(), HostError>;

    /// Attach install click handlers to buttons matching `selector` that sit
    /// inside an element matching `within`; returns the number wired.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be queried.
    fn wire_install_buttons(&self, selector: &str, within: &str) -> Result<usize, HostError>;

    /// Start listening for the native "app installed" notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be attached.
    fn listen_for_app_installed(&self) -> Result<(), HostError>;

    /// Show the custom prompt for `platform` after `delay_ms`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer cannot be scheduled.
    fn schedule_prompt(&self, platform: Platform, delay_ms: u32) -> Result<(), HostError>;

    /// Clear session storage and delete every Cache Storage entry in the background.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unsupported`] when the Cache API is missing.
    fn purge_caches(&self) -> Result<(), HostError>;
}

/// Everything the install coordinator needs from its environment.
pub trait PwaHost: KeyValueStore + Clock + DomSurface + BrowserProbe + InstallWiring {}

impl<T> PwaHost for T where T: KeyValueStore + Clock + DomSurface + BrowserProbe + InstallWiring {}
