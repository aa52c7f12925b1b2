//! [`PwaHost`](pwa_kit_core::PwaHost) implementation on top of `web-sys`.

use pwa_kit_core::{
    BrowserProbe, Clock, DomSurface, HostError, InstallPromptCoordinator, InstallWiring,
    KeyValueStore, Platform, purge_all,
};
use wasm_bindgen_futures::spawn_local;
use web_sys::Event;

use crate::cache::BrowserCaches;
use crate::dom::{
    PageDom, document, has_property, js_error_message, js_failure, local_storage, on_event,
    query_all, session_storage, sleep_ms, window,
};
use crate::install::{NativeInstallPrompt, SharedCoordinator, register_service_worker};

/// Browser host bound to one coordinator.
///
/// Clones are moved into every listener and timer it wires, which keeps the
/// coordinator alive for the rest of the page.
#[derive(Clone)]
pub struct BrowserHost {
    coordinator: SharedCoordinator,
    dom: PageDom,
}

impl BrowserHost {
    #[must_use]
    pub fn new(coordinator: SharedCoordinator) -> Self {
        Self {
            coordinator,
            dom: PageDom,
        }
    }

    fn with_coordinator<R>(
        &self,
        f: impl FnOnce(&InstallPromptCoordinator<NativeInstallPrompt>) -> R,
    ) -> Option<R> {
        match self.coordinator.try_borrow() {
            Ok(coordinator) => Some(f(&coordinator)),
            Err(_) => {
                log::warn!("install coordinator busy; event dropped");
                None
            }
        }
    }

    fn with_coordinator_mut<R>(
        &self,
        f: impl FnOnce(&mut InstallPromptCoordinator<NativeInstallPrompt>) -> R,
    ) -> Option<R> {
        match self.coordinator.try_borrow_mut() {
            Ok(mut coordinator) => Some(f(&mut coordinator)),
            Err(_) => {
                log::warn!("install coordinator busy; event dropped");
                None
            }
        }
    }

    fn handle_install_click(&self) {
        let Some(signal) = self
            .with_coordinator_mut(InstallPromptCoordinator::take_install_signal)
            .flatten()
        else {
            return;
        };
        let host = self.clone();
        spawn_local(async move {
            match signal.prompt_and_wait().await {
                Ok(outcome) => {
                    host.with_coordinator(|c| c.on_user_choice(outcome, &host));
                }
                Err(err) => log::error!("{err}"),
            }
        });
    }
}

/// `window.onload` has already run once the document is `complete`; a
/// listener attached now would never fire.
fn load_already_fired(ready_state: &str) -> bool {
    ready_state == "complete"
}

impl KeyValueStore for BrowserHost {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        local_storage()?
            .get_item(key)
            .map_err(js_failure("localStorage.getItem"))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        local_storage()?
            .set_item(key, value)
            .map_err(js_failure("localStorage.setItem"))
    }

    fn remove(&self, key: &str) -> Result<(), HostError> {
        local_storage()?
            .remove_item(key)
            .map_err(js_failure("localStorage.removeItem"))
    }
}

impl Clock for BrowserHost {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

impl DomSurface for BrowserHost {
    fn exists(&self, selector: &str) -> bool {
        self.dom.exists(selector)
    }

    fn set_class(&self, selector: &str, class: &str, on: bool) -> bool {
        self.dom.set_class(selector, class, on)
    }

    fn root_has_class(&self, class: &str) -> bool {
        self.dom.root_has_class(class)
    }

    fn set_root_class(&self, class: &str, on: bool) {
        self.dom.set_root_class(class, on);
    }

    fn media_matches(&self, query: &str) -> Result<bool, HostError> {
        self.dom.media_matches(query)
    }
}

impl BrowserProbe for BrowserHost {
    fn user_agent(&self) -> Option<String> {
        window().ok()?.navigator().user_agent().ok()
    }

    fn supports_install_prompt(&self) -> Option<bool> {
        window()
            .ok()
            .map(|win| has_property(&win, "onbeforeinstallprompt"))
    }
}

impl InstallWiring for BrowserHost {
    fn register_service_worker_on_load(&self, url: &str, scope: &str) -> Result<(), HostError> {
        let win = window()?;
        if !has_property(&win.navigator(), "serviceWorker") {
            return Err(HostError::Unsupported("serviceWorker"));
        }

        let (url, scope) = (url.to_string(), scope.to_string());
        let register = move || {
            let (url, scope) = (url.clone(), scope.clone());
            spawn_local(async move {
                if let Err(err) = register_service_worker(&url, &scope).await {
                    log::error!(
                        "Service Worker Registration Failed: {}",
                        js_error_message(&err)
                    );
                }
            });
        };

        if load_already_fired(&document()?.ready_state()) {
            register();
            Ok(())
        } else {
            on_event(&win, "load", move |_: Event| register())
        }
    }

    fn wire_dismiss_buttons(&self, selector: &str) -> Result<usize, HostError> {
        let buttons = query_all(selector)?;
        for button in &buttons {
            let host = self.clone();
            on_event(button, "click", move |_: Event| {
                host.with_coordinator(|c| c.on_dismiss(&host));
            })?;
        }
        Ok(buttons.len())
    }

    fn listen_for_install_signal(&self) -> Result<(), HostError> {
        let host = self.clone();
        on_event(&*window()?, "beforeinstallprompt", move |event: Event| {
            event.prevent_default();
            log::debug!("'beforeinstallprompt' event fired");
            let signal = NativeInstallPrompt::from(event);
            host.with_coordinator_mut(|c| c.on_install_signal(signal, &host));
        })
    }

    fn wire_install_buttons(&self, selector: &str, within: &str) -> Result<usize, HostError> {
        let mut wired = 0;
        for button in query_all(selector)? {
            if !matches!(button.closest(within), Ok(Some(_))) {
                continue;
            }
            let host = self.clone();
            on_event(&button, "click", move |_: Event| host.handle_install_click())?;
            wired += 1;
        }
        Ok(wired)
    }

    fn listen_for_app_installed(&self) -> Result<(), HostError> {
        let host = self.clone();
        on_event(&*window()?, "appinstalled", move |_: Event| {
            host.with_coordinator(|c| c.on_app_installed(&host));
        })
    }

    fn schedule_prompt(&self, platform: Platform, delay_ms: u32) -> Result<(), HostError> {
        window()?;
        let host = self.clone();
        spawn_local(async move {
            if let Err(err) = sleep_ms(delay_ms).await {
                log::warn!(
                    "{} prompt timer failed: {}",
                    platform.label(),
                    js_error_message(&err)
                );
                return;
            }
            host.with_coordinator(|c| c.show_prompt(platform, &host));
        });
        Ok(())
    }

    fn purge_caches(&self) -> Result<(), HostError> {
        match session_storage() {
            Ok(storage) => {
                if let Err(err) = storage.clear() {
                    log::warn!("sessionStorage not cleared: {}", js_error_message(&err));
                }
            }
            Err(err) => log::warn!("{err}"),
        }

        let caches = BrowserCaches::open().map_err(|_| HostError::Unsupported("caches"))?;
        spawn_local(async move {
            match purge_all(&caches).await {
                Ok(report) if report.is_clean() => {
                    log::info!("All caches deleted ({})", report.deleted.len());
                }
                Ok(report) => log::warn!(
                    "{} cache(s) deleted, {} failed",
                    report.deleted.len(),
                    report.failed.len()
                ),
                Err(err) => log::error!("Error during cache deletion: {err}"),
            }
        });
        Ok(())
    }
}
