//! PWA install/update handling for the browser.
//!
//! `initPWA(config)` builds one [`InstallPromptCoordinator`] per page and
//! hands it a [`BrowserHost`] that routes DOM and window events back into it.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use pwa_kit_core::{ConfigError, InitOutcome, InstallOutcome, InstallPromptCoordinator, PwaOverrides};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, RegistrationOptions, ServiceWorkerRegistration};

use crate::dom::{js_error_message, window};
use crate::host::BrowserHost;

/// Coordinator as shared between the host and its listeners.
pub type SharedCoordinator = Rc<RefCell<InstallPromptCoordinator<NativeInstallPrompt>>>;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("install event has no prompt() method")]
    MissingPrompt,
    #[error("native install prompt failed: {0}")]
    Js(String),
    #[error("{0}")]
    UnknownOutcome(String),
}

impl From<JsValue> for PromptError {
    fn from(value: JsValue) -> Self {
        Self::Js(js_error_message(&value))
    }
}

/// A captured `beforeinstallprompt` event.
///
/// Consumed by [`NativeInstallPrompt::prompt_and_wait`], so the native
/// prompt cannot be shown twice from the same event.
#[derive(Debug)]
pub struct NativeInstallPrompt {
    event: Event,
}

impl From<Event> for NativeInstallPrompt {
    fn from(event: Event) -> Self {
        Self { event }
    }
}

impl NativeInstallPrompt {
    /// Show the browser's install UI and wait for the user's answer.
    ///
    /// # Errors
    /// Returns an error if the event lacks the prompt API, the browser
    /// rejects the call, or the outcome is not recognised.
    #[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
    pub async fn prompt_and_wait(self) -> Result<InstallOutcome, PromptError> {
        let prompt = Reflect::get(&self.event, &JsValue::from_str("prompt"))?
            .dyn_into::<Function>()
            .map_err(|_| PromptError::MissingPrompt)?;
        prompt.call0(&self.event)?;

        let choice = Reflect::get(&self.event, &JsValue::from_str("userChoice"))?
            .dyn_into::<Promise>()
            .map_err(|_| PromptError::MissingPrompt)?;
        let choice = JsFuture::from(choice).await?;
        let outcome = Reflect::get(&choice, &JsValue::from_str("outcome"))?
            .as_string()
            .unwrap_or_default();
        outcome.parse().map_err(PromptError::UnknownOutcome)
    }
}

/// Register the service worker and ask it to check for an update.
///
/// # Errors
/// Returns the browser's rejection of either call.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn register_service_worker(url: &str, scope: &str) -> Result<(), JsValue> {
    let win = window().map_err(|err| JsValue::from_str(&err.to_string()))?;
    let options = RegistrationOptions::new();
    options.set_scope(scope);
    let registration = JsFuture::from(
        win.navigator()
            .service_worker()
            .register_with_options(url, &options),
    )
    .await?
    .dyn_into::<ServiceWorkerRegistration>()?;
    log::info!(
        "Service Worker registered with scope: {}",
        registration.scope()
    );
    JsFuture::from(registration.update()?).await?;
    Ok(())
}

fn parse_overrides(config: JsValue) -> Result<PwaOverrides, ConfigError> {
    if config.is_undefined() || config.is_null() {
        return Ok(PwaOverrides::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| ConfigError::Malformed(e.to_string()))
}

/// Start install prompt handling for this page.
///
/// # Errors
/// Returns the configuration error; nothing has been touched in that case.
pub fn start_install_prompts(overrides: PwaOverrides) -> Result<InitOutcome, ConfigError> {
    let coordinator: SharedCoordinator =
        Rc::new(RefCell::new(InstallPromptCoordinator::new(overrides)?));
    let host = BrowserHost::new(Rc::clone(&coordinator));
    let outcome = coordinator.borrow().initialize(&host);
    Ok(outcome)
}

/// JavaScript entry point: `initPWA({ appName: "Demo", reminderDays: 2 })`.
#[wasm_bindgen(js_name = initPWA)]
pub fn init_pwa(config: JsValue) {
    let result = parse_overrides(config).and_then(start_install_prompts);
    match result {
        Ok(InitOutcome::Started(report)) => log::debug!("PWA init report: {report:?}"),
        Ok(_) => {}
        Err(err) => log::error!("PWA initialization aborted: {err}"),
    }
}
