//! Install prompt coordinator.
//!
//! Decides per platform whether and when the custom "install this app"
//! prompt is shown, honors a prior dismissal for the configured cooldown,
//! and triggers service-worker registration. All browser access goes
//! through [`PwaHost`]; event callbacks wired by the host call back into
//! the `on_*`/`show_prompt` methods below.

use serde::Serialize;

use crate::config::{ConfigError, PwaConfig, PwaOverrides};
use crate::constants::{ACTIVE_CLASS, FULLSCREEN_QUERY, INIT_MARKER_CLASS, PROMPT_DELAY_MS};
use crate::deferred::{DeferredPrompt, InstallOutcome};
use crate::dismissal::{CooldownStatus, DismissalLedger};
use crate::host::{HostError, PwaHost};
use crate::platform::{Platform, PlatformProbe};

/// How a single initialization step ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Done,
    /// Not requested by the configuration.
    Skipped,
    /// The browser lacks the capability or the call failed; already logged.
    Unavailable(String),
}

impl From<Result<(), HostError>> for StepStatus {
    fn from(result: Result<(), HostError>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(err) => Self::Unavailable(err.to_string()),
        }
    }
}

/// Which install flow was wired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InstallFlow {
    /// Neither prompt surface exists in the page.
    NoPromptSurface,
    /// The user agent is not a supported mobile platform.
    Unsupported,
    Android {
        listening: bool,
        install_buttons: usize,
    },
    Ios {
        scheduled: bool,
    },
}

/// Summary of a completed initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub service_worker: StepStatus,
    /// `None` when storage was unavailable.
    pub cooldown: Option<CooldownStatus>,
    pub dismiss_buttons: usize,
    pub flow: InstallFlow,
    pub cache_purge: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InitOutcome {
    /// `enabled` was false; nothing was touched.
    Disabled,
    /// The page already carries the initialization marker.
    AlreadyInitialized,
    Started(InitReport),
}

/// Owns the merged configuration and the captured install signal.
///
/// `S` is the host's representation of the native eligibility event.
#[derive(Debug)]
pub struct InstallPromptCoordinator<S> {
    config: PwaConfig,
    ledger: DismissalLedger,
    deferred: DeferredPrompt<S>,
}

impl<S> InstallPromptCoordinator<S> {
    /// Merge `overrides` onto the defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; nothing has been touched yet.
    pub fn new(overrides: PwaOverrides) -> Result<Self, ConfigError> {
        Self::from_config(PwaConfig::default().merged(overrides))
    }

    /// # Errors
    ///
    /// Returns the validation failure of `config`.
    pub fn from_config(config: PwaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ledger: DismissalLedger::for_config(&config),
            config,
            deferred: DeferredPrompt::empty(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PwaConfig {
        &self.config
    }

    #[must_use]
    pub const fn ledger(&self) -> &DismissalLedger {
        &self.ledger
    }

    /// Whether a captured eligibility signal is waiting for an install click.
    #[must_use]
    pub const fn has_install_signal(&self) -> bool {
        self.deferred.is_armed()
    }

    /// Run the initialization sequence once per page.
    ///
    /// Each step degrades to a logged warning on failure; no step prevents
    /// the ones after it.
    pub fn initialize<H: PwaHost + ?Sized>(&self, host: &H) -> InitOutcome {
        if !self.config.enabled {
            log::warn!("PWA install handling disabled by configuration");
            return InitOutcome::Disabled;
        }
        if host.root_has_class(INIT_MARKER_CLASS) {
            log::warn!("PWA install handling already initialized for this page");
            return InitOutcome::AlreadyInitialized;
        }
        host.set_root_class(INIT_MARKER_CLASS, true);

        let service_worker = StepStatus::from(
            host.register_service_worker_on_load(
                &self.config.service_worker_url,
                &self.config.service_worker_scope,
            )
            .inspect_err(|err| log::warn!("service worker registration skipped: {err}")),
        );

        let cooldown = self
            .ledger
            .reconcile(host, host.now_ms())
            .inspect_err(|err| log::warn!("install prompt cooldown not reconciled: {err}"))
            .ok();

        let dismiss_buttons = host
            .wire_dismiss_buttons(&self.config.dismiss_button_selector)
            .inspect_err(|err| log::warn!("dismiss buttons not wired: {err}"))
            .unwrap_or(0);

        let flow = self.wire_platform_flow(host);

        let cache_purge = if self.config.clear_cache_on_load {
            StepStatus::from(
                host.purge_caches()
                    .inspect_err(|err| log::warn!("cache purge skipped: {err}")),
            )
        } else {
            StepStatus::Skipped
        };

        log::info!("PWA handler initialized for {}", self.config.app_name);
        InitOutcome::Started(InitReport {
            service_worker,
            cooldown,
            dismiss_buttons,
            flow,
            cache_purge,
        })
    }

    fn wire_platform_flow<H: PwaHost + ?Sized>(&self, host: &H) -> InstallFlow {
        let has_surface = host.exists(&self.config.android_prompt_selector)
            || host.exists(&self.config.ios_prompt_selector);
        if !has_surface {
            return InstallFlow::NoPromptSurface;
        }

        let probe = PlatformProbe::detect(
            host.user_agent().as_deref(),
            host.supports_install_prompt(),
        );
        let rejected = self.is_rejected(host);

        match probe.platform {
            Some(Platform::Android) => {
                let listening = if rejected {
                    false
                } else if probe.native_prompt {
                    host.listen_for_install_signal()
                        .inspect_err(|err| log::warn!("install signal listener not attached: {err}"))
                        .is_ok()
                } else {
                    log::debug!("browser exposes no native install event");
                    false
                };
                let install_buttons = host
                    .wire_install_buttons(
                        &self.config.install_button_selector,
                        &self.config.android_prompt_selector,
                    )
                    .inspect_err(|err| log::warn!("install buttons not wired: {err}"))
                    .unwrap_or(0);
                if let Err(err) = host.listen_for_app_installed() {
                    log::warn!("appinstalled listener not attached: {err}");
                }
                InstallFlow::Android {
                    listening,
                    install_buttons,
                }
            }
            Some(Platform::Ios) => {
                let scheduled = !rejected
                    && host
                        .schedule_prompt(Platform::Ios, PROMPT_DELAY_MS)
                        .inspect_err(|err| log::warn!("iOS prompt not scheduled: {err}"))
                        .is_ok();
                InstallFlow::Ios { scheduled }
            }
            None => InstallFlow::Unsupported,
        }
    }

    fn is_rejected<H: PwaHost + ?Sized>(&self, host: &H) -> bool {
        self.ledger.is_rejected(host).unwrap_or_else(|err| {
            log::warn!("install prompt state unreadable: {err}");
            false
        })
    }

    fn persist_rejection<H: PwaHost + ?Sized>(&self, host: &H) {
        if let Err(err) = self.ledger.record_rejection(host, host.now_ms()) {
            log::warn!("install prompt rejection not persisted: {err}");
        }
    }

    /// Remove the active class from both prompt surfaces and the menu hider.
    pub fn hide_prompts<H: PwaHost + ?Sized>(&self, host: &H) {
        for selector in self.config.surface_selectors() {
            host.set_class(selector, ACTIVE_CLASS, false);
        }
    }

    /// Dismiss-button click: hide everything and start the cooldown.
    pub fn on_dismiss<H: PwaHost + ?Sized>(&self, host: &H) {
        self.hide_prompts(host);
        self.persist_rejection(host);
        log::info!(
            "PWA install rejected; reminding in {} day(s)",
            self.config.reminder_days
        );
    }

    /// Native eligibility signal: keep it and show the Android prompt after the delay.
    pub fn on_install_signal<H: PwaHost + ?Sized>(&mut self, signal: S, host: &H) {
        self.deferred.capture(signal);
        if let Err(err) = host.schedule_prompt(Platform::Android, PROMPT_DELAY_MS) {
            log::warn!("Android prompt not scheduled: {err}");
        }
    }

    /// Delayed show of a platform prompt. Returns whether the surface became active.
    ///
    /// A rejection recorded while the timer was pending suppresses the prompt,
    /// as does a fullscreen display mode at show time.
    pub fn show_prompt<H: PwaHost + ?Sized>(&self, platform: Platform, host: &H) -> bool {
        if self.is_rejected(host) {
            log::debug!("{} prompt suppressed by a recent rejection", platform.label());
            return false;
        }
        match host.media_matches(FULLSCREEN_QUERY) {
            Ok(true) => return false,
            Ok(false) => {}
            Err(err) => log::warn!("display mode unknown: {err}"),
        }

        let selector = match platform {
            Platform::Android => &self.config.android_prompt_selector,
            Platform::Ios => &self.config.ios_prompt_selector,
        };
        if !host.set_class(selector, ACTIVE_CLASS, true) {
            return false;
        }
        host.set_class(&self.config.menu_hider_selector, ACTIVE_CLASS, true);
        log::debug!("showing {} install prompt", platform.label());
        true
    }

    /// Install-button click: hand out the captured signal, at most once.
    pub fn take_install_signal(&mut self) -> Option<S> {
        let signal = self.deferred.take();
        if signal.is_none() {
            log::debug!("install button clicked without a captured install signal");
        }
        signal
    }

    /// Outcome of the native prompt triggered by [`Self::take_install_signal`].
    pub fn on_user_choice<H: PwaHost + ?Sized>(&self, outcome: InstallOutcome, host: &H) {
        match outcome {
            InstallOutcome::Accepted => log::info!("PWA added to home screen"),
            InstallOutcome::Dismissed => {
                self.persist_rejection(host);
                self.hide_prompts(host);
            }
        }
    }

    /// Native "app installed" notification.
    pub fn on_app_installed<H: PwaHost + ?Sized>(&self, host: &H) {
        log::info!("PWA installed");
        self.hide_prompts(host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryHost, Wiring};

    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8)";
    const IOS_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X)";

    fn coordinator() -> InstallPromptCoordinator<&'static str> {
        InstallPromptCoordinator::new(PwaOverrides {
            app_name: Some("Demo".into()),
            ..PwaOverrides::default()
        })
        .unwrap()
    }

    fn page(ua: &str) -> MemoryHost {
        MemoryHost::new()
            .with_user_agent(ua)
            .with_elements(&[
                "#menu-install-pwa-android",
                "#menu-install-pwa-ios",
                ".menu-hider",
            ])
            .with_dismiss_buttons(2)
            .with_install_buttons(1)
    }

    #[test]
    fn wiring_runs_in_order() {
        let host = page(ANDROID_UA);
        let outcome = coordinator().initialize(&host);
        let InitOutcome::Started(report) = outcome else {
            panic!("expected start, got {outcome:?}");
        };
        assert_eq!(report.service_worker, StepStatus::Done);
        assert_eq!(report.cooldown, Some(CooldownStatus::Seeded));
        assert_eq!(report.dismiss_buttons, 2);
        assert_eq!(
            report.flow,
            InstallFlow::Android {
                listening: true,
                install_buttons: 1
            }
        );
        assert_eq!(report.cache_purge, StepStatus::Skipped);
        assert_eq!(
            host.wiring(),
            vec![
                Wiring::ServiceWorker {
                    url: "/service-worker.js".into(),
                    scope: "/".into()
                },
                Wiring::DismissButtons(".pwa-dismiss".into()),
                Wiring::InstallSignalListener,
                Wiring::InstallButtons {
                    selector: ".pwa-install".into(),
                    within: "#menu-install-pwa-android".into()
                },
                Wiring::AppInstalledListener,
            ]
        );
    }

    #[test]
    fn missing_service_worker_does_not_stop_init() {
        let host = page(IOS_UA).without_capability("serviceWorker");
        let InitOutcome::Started(report) = coordinator().initialize(&host) else {
            panic!("expected start");
        };
        assert!(matches!(report.service_worker, StepStatus::Unavailable(_)));
        assert_eq!(report.flow, InstallFlow::Ios { scheduled: true });
    }

    #[test]
    fn signal_schedules_android_prompt() {
        let host = page(ANDROID_UA);
        let mut coord = coordinator();
        coord.initialize(&host);
        coord.on_install_signal("event", &host);
        assert!(coord.has_install_signal());
        assert!(
            host.wiring()
                .contains(&Wiring::PromptTimer(Platform::Android, PROMPT_DELAY_MS))
        );
        assert!(coord.show_prompt(Platform::Android, &host));
        assert!(host.has_class("#menu-install-pwa-android", ACTIVE_CLASS));
        assert!(host.has_class(".menu-hider", ACTIVE_CLASS));
    }

    #[test]
    fn rejection_during_delay_suppresses_prompt() {
        let host = page(IOS_UA);
        let coord = coordinator();
        coord.initialize(&host);
        coord.on_dismiss(&host);
        assert!(!coord.show_prompt(Platform::Ios, &host));
        assert!(!host.has_class("#menu-install-pwa-ios", ACTIVE_CLASS));
    }

    #[test]
    fn dismissed_choice_persists_rejection_and_hides() {
        let host = page(ANDROID_UA);
        host.set_now(5_000);
        let mut coord = coordinator();
        coord.initialize(&host);
        coord.on_install_signal("event", &host);
        coord.show_prompt(Platform::Android, &host);

        let signal = coord.take_install_signal();
        assert_eq!(signal, Some("event"));
        coord.on_user_choice(InstallOutcome::Dismissed, &host);

        assert_eq!(host.stored("Demo-PWA-Prompt").as_deref(), Some("install-rejected"));
        assert_eq!(host.stored("Demo-PWA-Timeout-Value").as_deref(), Some("5000"));
        assert!(!host.has_class("#menu-install-pwa-android", ACTIVE_CLASS));
        assert_eq!(coord.take_install_signal(), None);
    }

    #[test]
    fn accepted_choice_leaves_prompt_state_alone() {
        let host = page(ANDROID_UA);
        let mut coord = coordinator();
        coord.initialize(&host);
        coord.on_install_signal("event", &host);
        let _ = coord.take_install_signal();
        coord.on_user_choice(InstallOutcome::Accepted, &host);
        assert_eq!(host.stored("Demo-PWA-Prompt"), None);
    }

    #[test]
    fn unknown_platform_wires_nothing_platform_specific() {
        let host = page("Mozilla/5.0 (Windows NT 10.0; Win64; x64)");
        let InitOutcome::Started(report) = coordinator().initialize(&host) else {
            panic!("expected start");
        };
        assert_eq!(report.flow, InstallFlow::Unsupported);
        assert!(!host.wiring().contains(&Wiring::AppInstalledListener));
    }

    #[test]
    fn unreadable_display_mode_still_shows_prompt() {
        let host = page(IOS_UA).without_capability("matchMedia");
        let coord = coordinator();
        coord.initialize(&host);
        assert!(coord.show_prompt(Platform::Ios, &host));
    }
}
