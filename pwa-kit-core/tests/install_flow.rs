use pwa_kit_core::constants::{ACTIVE_CLASS, FULLSCREEN_QUERY, INIT_MARKER_CLASS, PROMPT_DELAY_MS};
use pwa_kit_core::testing::{MemoryHost, Wiring};
use pwa_kit_core::{
    CooldownStatus, DomSurface, InitOutcome, InstallFlow, InstallOutcome,
    InstallPromptCoordinator, Platform, PwaOverrides, StepStatus,
};

const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 13; SM-S911B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Mobile Safari/537.36";
const IOS_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

const ANDROID_SURFACE: &str = "#menu-install-pwa-android";
const IOS_SURFACE: &str = "#menu-install-pwa-ios";
const MENU_HIDER: &str = ".menu-hider";

#[derive(Debug, PartialEq)]
struct NativeSignal(u32);

fn demo(overrides: PwaOverrides) -> InstallPromptCoordinator<NativeSignal> {
    InstallPromptCoordinator::new(PwaOverrides {
        app_name: Some("Demo".into()),
        ..overrides
    })
    .expect("valid config")
}

fn mobile_page(ua: &str) -> MemoryHost {
    MemoryHost::new()
        .with_user_agent(ua)
        .with_elements(&[ANDROID_SURFACE, IOS_SURFACE, MENU_HIDER])
        .with_dismiss_buttons(1)
        .with_install_buttons(1)
}

fn started(outcome: InitOutcome) -> pwa_kit_core::InitReport {
    match outcome {
        InitOutcome::Started(report) => report,
        other => panic!("expected initialization to start, got {other:?}"),
    }
}

#[test]
fn disabled_config_touches_nothing() {
    let host = mobile_page(ANDROID_UA);
    let coord = demo(PwaOverrides {
        enabled: Some(false),
        clear_cache_on_load: Some(true),
        ..PwaOverrides::default()
    });
    assert_eq!(coord.initialize(&host), InitOutcome::Disabled);
    assert_eq!(host.storage_writes(), 0);
    assert_eq!(host.dom_mutations(), 0);
    assert!(host.wiring().is_empty());
}

#[test]
fn second_initialization_is_a_no_op() {
    let host = mobile_page(IOS_UA);
    let coord = demo(PwaOverrides::default());
    started(coord.initialize(&host));
    assert!(host.root_has_class(INIT_MARKER_CLASS));
    let wiring_after_first = host.wiring();
    let writes_after_first = host.storage_writes();

    let again = demo(PwaOverrides::default());
    assert_eq!(again.initialize(&host), InitOutcome::AlreadyInitialized);
    assert_eq!(host.wiring(), wiring_after_first);
    assert_eq!(host.storage_writes(), writes_after_first);
}

#[test]
fn cooldown_example_from_two_page_loads() {
    let first = mobile_page(IOS_UA);
    first.set_now(0);
    let report = started(demo(PwaOverrides::default()).initialize(&first));
    assert_eq!(report.cooldown, Some(CooldownStatus::Seeded));
    assert_eq!(first.stored("Demo-PWA-Timeout-Value").as_deref(), Some("0"));

    // Next page load shares storage but not the DOM.
    let second = mobile_page(IOS_UA);
    second.seed_storage("Demo-PWA-Timeout-Value", "0");
    second.seed_storage("Demo-PWA-Prompt", "install-rejected");
    second.set_now(90_000_000);
    let report = started(demo(PwaOverrides::default()).initialize(&second));
    assert_eq!(report.cooldown, Some(CooldownStatus::Expired));
    assert_eq!(second.stored("Demo-PWA-Prompt"), None);
    assert_eq!(
        second.stored("Demo-PWA-Timeout-Value").as_deref(),
        Some("90000000")
    );
    assert_eq!(report.flow, InstallFlow::Ios { scheduled: true });
}

#[test]
fn recent_rejection_blocks_listener_and_prompt() {
    for ua in [ANDROID_UA, IOS_UA] {
        let host = mobile_page(ua);
        host.seed_storage("Demo-PWA-Timeout-Value", "1000");
        host.seed_storage("Demo-PWA-Prompt", "install-rejected");
        host.set_now(1_000 + 3_600_000);

        let coord = demo(PwaOverrides::default());
        let report = started(coord.initialize(&host));
        assert_eq!(report.cooldown, Some(CooldownStatus::Running));
        assert!(!host.wiring().contains(&Wiring::InstallSignalListener));
        assert!(
            !host
                .wiring()
                .iter()
                .any(|w| matches!(w, Wiring::PromptTimer(..)))
        );
        assert!(!coord.show_prompt(Platform::Android, &host));
        assert!(!coord.show_prompt(Platform::Ios, &host));
        assert!(!host.has_class(ANDROID_SURFACE, ACTIVE_CLASS));
        assert!(!host.has_class(IOS_SURFACE, ACTIVE_CLASS));
    }
}

#[test]
fn dismiss_hides_everything_and_persists_rejection() {
    let host = mobile_page(IOS_UA);
    host.set_now(12_345);
    let coord = demo(PwaOverrides::default());
    started(coord.initialize(&host));
    assert!(coord.show_prompt(Platform::Ios, &host));
    host.set_class(ANDROID_SURFACE, ACTIVE_CLASS, true);

    coord.on_dismiss(&host);

    for surface in [ANDROID_SURFACE, IOS_SURFACE, MENU_HIDER] {
        assert!(!host.has_class(surface, ACTIVE_CLASS), "{surface} still active");
    }
    assert_eq!(
        host.stored("Demo-PWA-Prompt").as_deref(),
        Some("install-rejected")
    );
    assert_eq!(
        host.stored("Demo-PWA-Timeout-Value").as_deref(),
        Some("12345")
    );
}

#[test]
fn android_accept_then_installed_hides_prompts() {
    let host = mobile_page(ANDROID_UA);
    let mut coord = demo(PwaOverrides::default());
    let report = started(coord.initialize(&host));
    assert_eq!(
        report.flow,
        InstallFlow::Android {
            listening: true,
            install_buttons: 1
        }
    );

    coord.on_install_signal(NativeSignal(7), &host);
    assert!(
        host.wiring()
            .contains(&Wiring::PromptTimer(Platform::Android, PROMPT_DELAY_MS))
    );
    assert!(coord.show_prompt(Platform::Android, &host));
    assert!(host.has_class(ANDROID_SURFACE, ACTIVE_CLASS));

    let signal = coord.take_install_signal();
    assert_eq!(signal, Some(NativeSignal(7)));
    coord.on_user_choice(InstallOutcome::Accepted, &host);
    coord.on_app_installed(&host);

    assert!(!host.has_class(ANDROID_SURFACE, ACTIVE_CLASS));
    assert!(!host.has_class(IOS_SURFACE, ACTIVE_CLASS));
    assert!(!host.has_class(MENU_HIDER, ACTIVE_CLASS));
    assert_eq!(coord.take_install_signal(), None);
    assert_eq!(host.stored("Demo-PWA-Prompt"), None);
}

#[test]
fn ios_prompt_appears_after_delay_unless_fullscreen() {
    let host = mobile_page(IOS_UA);
    let coord = demo(PwaOverrides::default());
    started(coord.initialize(&host));
    assert!(
        host.wiring()
            .contains(&Wiring::PromptTimer(Platform::Ios, PROMPT_DELAY_MS))
    );
    assert!(coord.show_prompt(Platform::Ios, &host));
    assert!(host.has_class(IOS_SURFACE, ACTIVE_CLASS));
    assert!(host.has_class(MENU_HIDER, ACTIVE_CLASS));

    let fullscreen = mobile_page(IOS_UA).with_media(FULLSCREEN_QUERY, true);
    let coord = demo(PwaOverrides::default());
    started(coord.initialize(&fullscreen));
    assert!(!coord.show_prompt(Platform::Ios, &fullscreen));
    assert!(!fullscreen.has_class(IOS_SURFACE, ACTIVE_CLASS));
    assert!(!fullscreen.has_class(MENU_HIDER, ACTIVE_CLASS));
}

#[test]
fn page_without_prompt_surfaces_skips_platform_flow() {
    let host = MemoryHost::new()
        .with_user_agent(ANDROID_UA)
        .with_dismiss_buttons(1);
    let report = started(demo(PwaOverrides::default()).initialize(&host));
    assert_eq!(report.flow, InstallFlow::NoPromptSurface);
    assert_eq!(report.dismiss_buttons, 1);
    assert!(
        host.wiring()
            .contains(&Wiring::DismissButtons(".pwa-dismiss".into()))
    );
}

#[test]
fn missing_capabilities_degrade_step_by_step() {
    let host = mobile_page(ANDROID_UA)
        .without_capability("localStorage")
        .without_capability("serviceWorker")
        .without_capability("caches");
    let coord = demo(PwaOverrides {
        clear_cache_on_load: Some(true),
        ..PwaOverrides::default()
    });
    let report = started(coord.initialize(&host));
    assert!(matches!(report.service_worker, StepStatus::Unavailable(_)));
    assert_eq!(report.cooldown, None);
    assert!(matches!(report.cache_purge, StepStatus::Unavailable(_)));
    assert!(matches!(report.flow, InstallFlow::Android { listening: true, .. }));
}

#[test]
fn cache_purge_is_requested_last_when_configured() {
    let host = mobile_page(IOS_UA);
    let coord = demo(PwaOverrides {
        clear_cache_on_load: Some(true),
        ..PwaOverrides::default()
    });
    let report = started(coord.initialize(&host));
    assert_eq!(report.cache_purge, StepStatus::Done);
    assert_eq!(host.wiring().last(), Some(&Wiring::CachePurge));
}

#[test]
fn host_without_native_install_event_gets_no_listener() {
    let host = mobile_page(ANDROID_UA).with_native_prompt(Some(false));
    let report = started(demo(PwaOverrides::default()).initialize(&host));
    assert_eq!(
        report.flow,
        InstallFlow::Android {
            listening: false,
            install_buttons: 1
        }
    );
    assert!(host.wiring().contains(&Wiring::AppInstalledListener));
}

#[test]
fn invalid_config_is_rejected_before_any_host_access() {
    let result = InstallPromptCoordinator::<NativeSignal>::new(PwaOverrides {
        app_name: Some(String::new()),
        ..PwaOverrides::default()
    });
    assert!(result.is_err());
}
