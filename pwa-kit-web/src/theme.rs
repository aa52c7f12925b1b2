//! Light/dark theme manager.
//!
//! Reads the body classes and `prefers-color-scheme`, applies the decisions
//! from [`pwa_kit_core::theme`] and keeps toggles and storage in sync.

use std::rc::Rc;

use pwa_kit_core::constants::{
    PREFERS_DARK_QUERY, PREFERS_LIGHT_QUERY, THEME_DARK_CLASS, THEME_DETECT_BUTTON_SELECTOR,
    THEME_DETECT_CLASS, THEME_DETECT_DELAY_MS, THEME_LIGHT_CLASS, THEME_TRANSITION_RESTORE_MS,
    THEME_TRANSITION_SELECTOR,
};
use pwa_kit_core::{
    BodyThemeClasses, ConfigError, HostError, InitialTheme, SystemScheme, Theme, ThemeConfig,
    initial_theme, on_scheme_change, toggle_target,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, HtmlElement, HtmlInputElement, MediaQueryListEvent};

use crate::dom::{
    document, js_error_message, js_failure, local_storage, media_matches, on_event, query_all,
    sleep_ms, window,
};

#[derive(Clone)]
struct ThemeController {
    config: Rc<ThemeConfig>,
}

impl ThemeController {
    fn body() -> Option<HtmlElement> {
        document().ok()?.body()
    }

    fn body_classes() -> BodyThemeClasses {
        Self::body().map_or_else(BodyThemeClasses::default, |body| {
            let classes = body.class_list();
            BodyThemeClasses {
                dark: classes.contains(THEME_DARK_CLASS),
                light: classes.contains(THEME_LIGHT_CLASS),
                detect: classes.contains(THEME_DETECT_CLASS),
                any_class: classes.length() > 0,
            }
        })
    }

    fn system_scheme() -> SystemScheme {
        SystemScheme {
            prefers_dark: media_matches(PREFERS_DARK_QUERY).unwrap_or(false),
            prefers_light: media_matches(PREFERS_LIGHT_QUERY).unwrap_or(false),
        }
    }

    fn saved(&self) -> Option<Theme> {
        local_storage()
            .ok()?
            .get_item(&self.config.storage_key())
            .ok()
            .flatten()
            .as_deref()
            .and_then(Theme::from_stored)
    }

    fn persist(&self, theme: Theme) {
        let result = local_storage().and_then(|storage| {
            storage
                .set_item(&self.config.storage_key(), theme.stored_value())
                .map_err(js_failure("localStorage.setItem"))
        });
        if let Err(err) = result {
            log::warn!("theme not saved: {err}");
        }
    }

    fn sync_toggles(&self, theme: Theme) {
        let Ok(toggles) = query_all(&self.config.toggle_dark_selectors) else {
            return;
        };
        for toggle in toggles {
            if let Ok(input) = toggle.dyn_into::<HtmlInputElement>() {
                input.set_checked(theme.is_dark());
            }
        }
    }

    /// Switch the body to `theme`, drop `detect-theme` and remember the choice.
    fn activate(&self, theme: Theme) {
        if let Some(body) = Self::body() {
            let classes = body.class_list();
            let _ = classes.add_1(theme.body_class());
            let _ = classes.remove_2(theme.other().body_class(), THEME_DETECT_CLASS);
        }
        self.sync_toggles(theme);
        self.persist(theme);
    }

    fn apply_saved(&self, theme: Theme) {
        if let Some(body) = Self::body() {
            body.set_class_name(theme.body_class());
        }
        self.sync_toggles(theme);
    }

    fn set_transitions(enabled: bool) {
        let Ok(elements) = query_all(THEME_TRANSITION_SELECTOR) else {
            return;
        };
        let value = if enabled { "" } else { "all 0s ease" };
        for element in elements {
            if let Ok(element) = element.dyn_into::<HtmlElement>() {
                let _ = element.style().set_property("transition", value);
            }
        }
    }

    fn apply_initial(&self) {
        match initial_theme(self.saved(), Self::body_classes(), Self::system_scheme()) {
            InitialTheme::Saved(theme) => self.apply_saved(theme),
            InitialTheme::System(theme) => self.activate(theme),
            InitialTheme::Keep => {}
        }
    }

    fn on_toggle_click(&self) {
        Self::set_transitions(false);
        let target = toggle_target(Self::body_classes(), Self::system_scheme());
        self.activate(target);
        spawn_local(async {
            if sleep_ms(THEME_TRANSITION_RESTORE_MS).await.is_ok() {
                Self::set_transitions(true);
            }
        });
    }

    fn on_detect_click(&self) {
        if let Some(body) = Self::body() {
            let classes = body.class_list();
            let _ = classes.remove_2(THEME_DARK_CLASS, THEME_LIGHT_CLASS);
            let _ = classes.add_1(THEME_DETECT_CLASS);
        }
        let controller = self.clone();
        spawn_local(async move {
            if let Err(err) = sleep_ms(THEME_DETECT_DELAY_MS).await {
                log::warn!("theme detection timer failed: {}", js_error_message(&err));
                return;
            }
            if let Some(theme) = Self::system_scheme().preferred() {
                controller.activate(theme);
            }
        });
    }

    fn watch_scheme(&self, query: &str, theme: Theme) -> Result<(), HostError> {
        let Some(list) = window()?
            .match_media(query)
            .map_err(js_failure("matchMedia"))?
        else {
            return Err(HostError::Unsupported("matchMedia"));
        };
        let controller = self.clone();
        on_event(&list, "change", move |event: Event| {
            let matches = event
                .dyn_ref::<MediaQueryListEvent>()
                .is_some_and(MediaQueryListEvent::matches);
            if let Some(theme) = on_scheme_change(Self::body_classes(), theme, matches) {
                controller.activate(theme);
            }
        })
    }

    /// Each control group is wired independently; a bad selector or a failed
    /// listener only loses that group.
    fn wire(&self) {
        self.wire_clicks(&self.config.toggle_dark_selectors, Self::on_toggle_click);
        self.wire_clicks(THEME_DETECT_BUTTON_SELECTOR, Self::on_detect_click);
        for (query, theme) in [
            (PREFERS_DARK_QUERY, Theme::Dark),
            (PREFERS_LIGHT_QUERY, Theme::Light),
        ] {
            if let Err(err) = self.watch_scheme(query, theme) {
                log::warn!("system theme changes not followed: {err}");
            }
        }
    }

    fn wire_clicks(&self, selector: &str, handler: fn(&Self)) {
        let elements = match query_all(selector) {
            Ok(elements) => elements,
            Err(err) => {
                log::warn!("theme controls {selector:?} not wired: {err}");
                return;
            }
        };
        for element in elements {
            let controller = self.clone();
            if let Err(err) = on_event(&element, "click", move |_: Event| handler(&controller)) {
                log::warn!("theme control {selector:?} not wired: {err}");
            }
        }
    }
}

/// Start the theme manager for `config`.
///
/// # Errors
/// Returns [`ConfigError::MissingAppName`] without touching the page when
/// no app name is configured.
pub fn start_theme_manager(config: ThemeConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let controller = ThemeController {
        config: Rc::new(config),
    };
    controller.apply_initial();
    controller.wire();
    Ok(())
}

/// JavaScript entry point: `initThemeManager({ appName: "Demo" })`.
#[wasm_bindgen(js_name = initThemeManager)]
pub fn init_theme_manager(config: JsValue) {
    let parsed = if config.is_undefined() || config.is_null() {
        Ok(ThemeConfig::new(""))
    } else {
        serde_wasm_bindgen::from_value::<ThemeConfig>(config)
            .map_err(|e| ConfigError::Malformed(e.to_string()))
    };
    let result = parsed.and_then(start_theme_manager);
    if let Err(err) = result {
        log::error!("Theme manager not started: {err}");
    }
}
