use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail, ensure};
use futures::executor::block_on;
use pwa_kit_core::constants::{ACTIVE_CLASS, FULLSCREEN_QUERY, INSTALL_REJECTED, PROMPT_DELAY_MS};
use pwa_kit_core::testing::{MemoryHost, Wiring};
use pwa_kit_core::{
    BodyThemeClasses, CooldownStatus, InitOutcome, InitReport, InitialTheme, InstallFlow,
    InstallOutcome, InstallPromptCoordinator, Platform, PwaConfig, StepStatus, StorageInfo,
    SystemScheme, Theme, hide_preloader, initial_theme, list_cached_files, purge_all,
    toggle_target,
};
use serde::{Deserialize, Serialize};

pub const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Mobile Safari/537.36";
pub const IOS_UA: &str = "Mozilla/5.0 (iPad; CPU OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";

/// Stand-in for the captured `beforeinstallprompt` event.
#[derive(Debug, PartialEq, Eq)]
struct SimulatedPrompt;

type Coordinator = InstallPromptCoordinator<SimulatedPrompt>;

pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    check: fn(&PwaConfig) -> Result<()>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub duration_us: u64,
}

impl ScenarioResult {
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.duration_us)
    }
}

impl Scenario {
    pub fn run(&self, config: &PwaConfig) -> ScenarioResult {
        let start = Instant::now();
        let outcome = (self.check)(config);
        let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        ScenarioResult {
            scenario_name: self.key.to_string(),
            passed: outcome.is_ok(),
            failures: outcome
                .err()
                .map(|err| vec![format!("{err:#}")])
                .unwrap_or_default(),
            duration_us,
        }
    }
}

pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "android-accept",
            description: "Android: native event, prompt shown, install accepted",
            check: android_accept,
        },
        Scenario {
            key: "android-dismiss",
            description: "Android: prompt dismissed and rejection persisted",
            check: android_dismiss,
        },
        Scenario {
            key: "ios-prompt",
            description: "iOS: instructions shown after the delay",
            check: ios_prompt,
        },
        Scenario {
            key: "ios-fullscreen",
            description: "iOS: no prompt while running fullscreen",
            check: ios_fullscreen,
        },
        Scenario {
            key: "cooldown",
            description: "Rejection blocks prompts until the reminder interval passes",
            check: cooldown,
        },
        Scenario {
            key: "disabled",
            description: "enabled: false leaves storage and the page untouched",
            check: disabled,
        },
        Scenario {
            key: "double-init",
            description: "A second initialization on the same page is ignored",
            check: double_init,
        },
        Scenario {
            key: "cache-purge",
            description: "Cache Storage is purged last and failures do not stop it",
            check: cache_purge,
        },
        Scenario {
            key: "storage-info",
            description: "Storage estimate is summarized in megabytes",
            check: storage_info,
        },
        Scenario {
            key: "preloader",
            description: "Preloader gets its hide class",
            check: preloader,
        },
        Scenario {
            key: "theme",
            description: "Saved, system and toggled themes",
            check: theme,
        },
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog()
        .into_iter()
        .map(|s| (s.key, s.description))
        .collect()
}

pub fn find_scenario(key: &str) -> Option<Scenario> {
    catalog().into_iter().find(|s| s.key == key)
}

fn page(config: &PwaConfig, user_agent: &str) -> MemoryHost {
    MemoryHost::new()
        .with_user_agent(user_agent)
        .with_elements(&config.surface_selectors())
        .with_dismiss_buttons(1)
        .with_install_buttons(1)
}

/// Install scenarios exercise a running coordinator, so `enabled: false`
/// from the loaded config only applies to the `disabled` scenario.
fn enabled(config: &PwaConfig) -> PwaConfig {
    PwaConfig {
        enabled: true,
        ..config.clone()
    }
}

fn start(config: &PwaConfig, host: &MemoryHost) -> Result<(Coordinator, InitReport)> {
    let coordinator = Coordinator::from_config(enabled(config))?;
    match coordinator.initialize(host) {
        InitOutcome::Started(report) => Ok((coordinator, report)),
        other => Err(anyhow!("initialization did not start: {other:?}")),
    }
}

fn ensure_hidden(config: &PwaConfig, host: &MemoryHost) -> Result<()> {
    for surface in config.surface_selectors() {
        ensure!(
            !host.has_class(surface, ACTIVE_CLASS),
            "{surface} is still active"
        );
    }
    Ok(())
}

fn android_accept(config: &PwaConfig) -> Result<()> {
    let host = page(config, ANDROID_UA);
    let (mut coordinator, report) = start(config, &host)?;
    ensure!(
        matches!(report.flow, InstallFlow::Android { listening: true, .. }),
        "unexpected flow {:?}",
        report.flow
    );

    coordinator.on_install_signal(SimulatedPrompt, &host);
    ensure!(
        host.wiring()
            .contains(&Wiring::PromptTimer(Platform::Android, PROMPT_DELAY_MS)),
        "Android prompt was not scheduled"
    );
    ensure!(
        coordinator.show_prompt(Platform::Android, &host),
        "Android prompt refused to show"
    );
    ensure!(
        host.has_class(&config.android_prompt_selector, ACTIVE_CLASS),
        "Android surface not activated"
    );

    ensure!(
        coordinator.take_install_signal().is_some(),
        "install signal missing at click time"
    );
    ensure!(
        coordinator.take_install_signal().is_none(),
        "install signal usable twice"
    );
    coordinator.on_user_choice(InstallOutcome::Accepted, &host);
    coordinator.on_app_installed(&host);
    ensure_hidden(config, &host)?;
    ensure!(
        host.stored(&config.prompt_key()).is_none(),
        "acceptance recorded as a rejection"
    );
    Ok(())
}

fn android_dismiss(config: &PwaConfig) -> Result<()> {
    let host = page(config, ANDROID_UA);
    host.set_now(42_000);
    let (mut coordinator, _) = start(config, &host)?;
    coordinator.on_install_signal(SimulatedPrompt, &host);
    ensure!(
        coordinator.show_prompt(Platform::Android, &host),
        "Android prompt refused to show"
    );

    let signal = coordinator.take_install_signal();
    ensure!(signal.is_some(), "install signal missing at click time");
    coordinator.on_user_choice(InstallOutcome::Dismissed, &host);

    ensure_hidden(config, &host)?;
    ensure!(
        host.stored(&config.prompt_key()).as_deref() == Some(INSTALL_REJECTED),
        "rejection not persisted"
    );
    ensure!(
        host.stored(&config.timeout_key()).as_deref() == Some("42000"),
        "rejection timestamp not persisted"
    );
    Ok(())
}

fn ios_prompt(config: &PwaConfig) -> Result<()> {
    let host = page(config, IOS_UA);
    let (coordinator, report) = start(config, &host)?;
    ensure!(
        report.flow == InstallFlow::Ios { scheduled: true },
        "unexpected flow {:?}",
        report.flow
    );
    ensure!(
        coordinator.show_prompt(Platform::Ios, &host),
        "iOS prompt refused to show"
    );
    ensure!(
        host.has_class(&config.ios_prompt_selector, ACTIVE_CLASS)
            && host.has_class(&config.menu_hider_selector, ACTIVE_CLASS),
        "iOS surface or menu hider not activated"
    );
    coordinator.on_dismiss(&host);
    ensure_hidden(config, &host)
}

fn ios_fullscreen(config: &PwaConfig) -> Result<()> {
    let host = page(config, IOS_UA).with_media(FULLSCREEN_QUERY, true);
    let (coordinator, _) = start(config, &host)?;
    ensure!(
        !coordinator.show_prompt(Platform::Ios, &host),
        "prompt shown in fullscreen"
    );
    ensure_hidden(config, &host)
}

fn cooldown(config: &PwaConfig) -> Result<()> {
    let window = config.cooldown_ms();

    let blocked = page(config, IOS_UA);
    blocked.seed_storage(&config.timeout_key(), "0");
    blocked.seed_storage(&config.prompt_key(), INSTALL_REJECTED);
    blocked.set_now(window);
    let (coordinator, report) = start(config, &blocked)?;
    ensure!(
        report.cooldown == Some(CooldownStatus::Running),
        "cooldown at the boundary reported {:?}",
        report.cooldown
    );
    ensure!(
        !coordinator.show_prompt(Platform::Ios, &blocked),
        "prompt shown during cooldown"
    );

    let expired = page(config, IOS_UA);
    expired.seed_storage(&config.timeout_key(), "0");
    expired.seed_storage(&config.prompt_key(), INSTALL_REJECTED);
    expired.set_now(window + 1);
    let (coordinator, report) = start(config, &expired)?;
    ensure!(
        report.cooldown == Some(CooldownStatus::Expired),
        "cooldown past the interval reported {:?}",
        report.cooldown
    );
    ensure!(
        expired.stored(&config.prompt_key()).is_none(),
        "rejection flag survived expiry"
    );
    ensure!(
        coordinator.show_prompt(Platform::Ios, &expired),
        "prompt blocked after expiry"
    );
    Ok(())
}

fn disabled(config: &PwaConfig) -> Result<()> {
    let off = PwaConfig {
        enabled: false,
        clear_cache_on_load: true,
        ..config.clone()
    };
    let host = page(&off, ANDROID_UA).with_cache("static-v1", &["/index.html"]);
    let outcome = Coordinator::from_config(off)?.initialize(&host);
    ensure!(
        outcome == InitOutcome::Disabled,
        "disabled initialization returned {outcome:?}"
    );
    ensure!(host.storage_writes() == 0, "storage written while disabled");
    ensure!(host.dom_mutations() == 0, "page changed while disabled");
    ensure!(host.wiring().is_empty(), "listeners wired while disabled");
    ensure!(
        host.cache_names_now().len() == 1,
        "caches purged while disabled"
    );
    Ok(())
}

fn double_init(config: &PwaConfig) -> Result<()> {
    let host = page(config, ANDROID_UA);
    start(config, &host)?;
    let wired = host.wiring().len();
    let again = Coordinator::from_config(enabled(config))?;
    match again.initialize(&host) {
        InitOutcome::AlreadyInitialized if host.wiring().len() == wired => Ok(()),
        InitOutcome::AlreadyInitialized => bail!("second initialization wired listeners"),
        other => bail!("second initialization returned {other:?}"),
    }
}

fn cache_purge(config: &PwaConfig) -> Result<()> {
    let purging = PwaConfig {
        clear_cache_on_load: true,
        ..config.clone()
    };
    let host = page(&purging, IOS_UA)
        .with_cache("static-v1", &["/index.html", "/app.js"])
        .with_cache("images-v1", &["/logo.png"])
        .with_cache("api-v1", &["/api/me"])
        .failing_cache_delete("images-v1");
    let (_, report) = start(&purging, &host)?;
    ensure!(
        report.cache_purge == StepStatus::Done,
        "cache purge step reported {:?}",
        report.cache_purge
    );
    ensure!(
        host.wiring().last() == Some(&Wiring::CachePurge),
        "cache purge was not the last step"
    );

    let listing = block_on(list_cached_files(&host))?;
    ensure!(listing.len() == 3, "expected 3 caches, listed {}", listing.len());

    let purge = block_on(purge_all(&host))?;
    ensure!(purge.deleted.len() == 2, "deleted {:?}", purge.deleted);
    ensure!(purge.failed.len() == 1, "failures {:?}", purge.failed);
    ensure!(
        host.cache_names_now() == vec!["images-v1".to_string()],
        "unexpected caches left: {:?}",
        host.cache_names_now()
    );
    Ok(())
}

fn storage_info(_: &PwaConfig) -> Result<()> {
    let info = StorageInfo::from_estimate(Some(5_242_880.0), Some(104_857_600.0));
    ensure!(
        info.usage_line() == "Cache Usage: 5MB / 100MB (5%)",
        "usage line was {:?}",
        info.usage_line()
    );
    let unknown = StorageInfo::from_estimate(None, None);
    ensure!(
        unknown.percentage_text == "0%",
        "missing estimate produced {:?}",
        unknown.percentage_text
    );
    Ok(())
}

fn preloader(_: &PwaConfig) -> Result<()> {
    let host = MemoryHost::new().with_elements(&["#preloader"]);
    ensure!(hide_preloader(&host), "preloader not found");
    ensure!(
        host.has_class("#preloader", "preloader-hide"),
        "preloader not hidden"
    );
    Ok(())
}

fn theme(_: &PwaConfig) -> Result<()> {
    let dark_system = SystemScheme {
        prefers_dark: true,
        prefers_light: false,
    };
    let saved = initial_theme(
        Theme::from_stored("light-mode"),
        BodyThemeClasses::default(),
        dark_system,
    );
    ensure!(
        saved == InitialTheme::Saved(Theme::Light),
        "saved theme ignored: {saved:?}"
    );

    let system = initial_theme(None, BodyThemeClasses::default(), dark_system);
    ensure!(
        system == InitialTheme::System(Theme::Dark),
        "system theme ignored: {system:?}"
    );

    let light_body = BodyThemeClasses {
        light: true,
        any_class: true,
        ..BodyThemeClasses::default()
    };
    ensure!(
        toggle_target(light_body, dark_system) == Theme::Dark,
        "toggle from light did not go dark"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scenario_passes_with_defaults() {
        let config = PwaConfig::default();
        for scenario in catalog() {
            let result = scenario.run(&config);
            assert!(result.passed, "{}: {:?}", result.scenario_name, result.failures);
        }
    }

    #[test]
    fn scenarios_follow_configured_selectors_and_interval() {
        let config = PwaConfig {
            app_name: "Custom".into(),
            reminder_days: 0.5,
            android_prompt_selector: "#install-android".into(),
            ios_prompt_selector: "#install-ios".into(),
            menu_hider_selector: ".backdrop".into(),
            ..PwaConfig::default()
        };
        for key in ["android-dismiss", "ios-prompt", "cooldown"] {
            let result = find_scenario(key).expect("known scenario").run(&config);
            assert!(result.passed, "{key}: {:?}", result.failures);
        }
    }

    #[test]
    fn disabled_config_does_not_fail_install_scenarios() {
        let config = PwaConfig {
            enabled: false,
            ..PwaConfig::default()
        };
        for scenario in catalog() {
            let result = scenario.run(&config);
            assert!(result.passed, "{}: {:?}", result.scenario_name, result.failures);
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = list_scenarios().into_iter().map(|(k, _)| k).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(find_scenario("missing").is_none());
    }
}
