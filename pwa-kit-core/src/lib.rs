//! pwa-kit core
//!
//! Platform-agnostic logic behind the pwa-kit browser utilities: the PWA
//! install prompt coordinator, Cache Storage cleanup, the preloader fade and
//! the light/dark theme manager. Browser access is abstracted behind the
//! traits in [`host`] and [`cache`], so everything here runs natively in tests.

pub mod cache;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod deferred;
pub mod dismissal;
pub mod host;
pub mod platform;
pub mod preloader;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod theme;

pub use cache::{
    CacheError, CacheListing, CacheStore, PurgeReport, StorageInfo, list_cached_files, purge_all,
};
pub use config::{ConfigError, PwaConfig, PwaOverrides};
pub use coordinator::{InitOutcome, InitReport, InstallFlow, InstallPromptCoordinator, StepStatus};
pub use deferred::{DeferredPrompt, InstallOutcome};
pub use dismissal::{CooldownStatus, DismissalLedger, DismissalState};
pub use host::{BrowserProbe, Clock, DomSurface, HostError, InstallWiring, KeyValueStore, PwaHost};
pub use platform::{Platform, PlatformProbe};
pub use preloader::hide_preloader;
pub use theme::{
    BodyThemeClasses, InitialTheme, SystemScheme, Theme, ThemeConfig, initial_theme,
    on_scheme_change, theme_key, toggle_target,
};
