use js_sys::{Function, Promise, Reflect};
use pwa_kit_core::{DomSurface, HostError};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Event, EventTarget, Storage, Window};

/// Retrieve the global `window` object.
///
/// # Errors
/// Returns [`HostError::Unsupported`] outside of a browser context.
pub fn window() -> Result<Window, HostError> {
    web_sys::window().ok_or(HostError::Unsupported("window"))
}

/// Retrieve the document object for DOM interactions.
///
/// # Errors
/// Returns [`HostError::Unsupported`] when no document is attached to the window.
pub fn document() -> Result<Document, HostError> {
    window()?
        .document()
        .ok_or(HostError::Unsupported("document"))
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Map a rejected browser call onto a [`HostError`].
pub fn js_failure(operation: &'static str) -> impl Fn(JsValue) -> HostError {
    move |value| HostError::failed(operation, js_error_message(&value))
}

/// Whether `target` exposes a property called `name`.
#[must_use]
pub fn has_property(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

fn timer_delay(duration_ms: u32) -> i32 {
    i32::try_from(duration_ms).unwrap_or(i32::MAX)
}

/// Yield execution for the requested number of milliseconds.
///
/// # Errors
/// Returns an error if the timer cannot be scheduled or the underlying JavaScript promise rejects.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn sleep_ms(duration_ms: u32) -> Result<(), JsValue> {
    let win = window().map_err(|err| JsValue::from_str(&err.to_string()))?;
    let mut resolve_slot: Option<Function> = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        resolve_slot = Some(resolve);
    });

    let resolve =
        resolve_slot.ok_or_else(|| JsValue::from_str("resolve function should be set"))?;
    let closure = Closure::once(move || {
        let _ = resolve.call0(&JsValue::UNDEFINED);
    });

    let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        timer_delay(duration_ms),
    )?;
    closure.forget();

    JsFuture::from(promise).await?;
    Ok(())
}

/// Attach a listener that lives for the rest of the page.
///
/// # Errors
/// Returns an error if the browser refuses the listener.
pub fn on_event(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), HostError> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(js_failure("addEventListener"))?;
    closure.forget();
    Ok(())
}

/// Every element matching `selector`, in document order.
///
/// # Errors
/// Returns an error if the document is missing or the selector is invalid.
pub fn query_all(selector: &str) -> Result<Vec<Element>, HostError> {
    let list = document()?
        .query_selector_all(selector)
        .map_err(js_failure("querySelectorAll"))?;
    Ok((0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

/// Access the browser `localStorage` handle.
///
/// # Errors
/// Returns an error if the browser window cannot be accessed or `localStorage` is unavailable.
pub fn local_storage() -> Result<Storage, HostError> {
    window()?
        .local_storage()
        .ok()
        .flatten()
        .ok_or(HostError::Unsupported("localStorage"))
}

/// Access the browser `sessionStorage` handle.
///
/// # Errors
/// Returns an error if the browser window cannot be accessed or `sessionStorage` is unavailable.
pub fn session_storage() -> Result<Storage, HostError> {
    window()?
        .session_storage()
        .ok()
        .flatten()
        .ok_or(HostError::Unsupported("sessionStorage"))
}

/// Evaluate a media query.
///
/// # Errors
/// Returns [`HostError::Unsupported`] when `matchMedia` is missing.
pub fn media_matches(query: &str) -> Result<bool, HostError> {
    window()?
        .match_media(query)
        .ok()
        .flatten()
        .map(|list| list.matches())
        .ok_or(HostError::Unsupported("matchMedia"))
}

/// The live document, seen through [`DomSurface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDom;

impl PageDom {
    fn first(selector: &str) -> Option<Element> {
        document().ok()?.query_selector(selector).ok().flatten()
    }
}

impl DomSurface for PageDom {
    fn exists(&self, selector: &str) -> bool {
        Self::first(selector).is_some()
    }

    fn set_class(&self, selector: &str, class: &str, on: bool) -> bool {
        let Some(element) = Self::first(selector) else {
            return false;
        };
        let classes = element.class_list();
        let _ = if on {
            classes.add_1(class)
        } else {
            classes.remove_1(class)
        };
        true
    }

    fn root_has_class(&self, class: &str) -> bool {
        document()
            .ok()
            .and_then(|doc| doc.document_element())
            .is_some_and(|root| root.class_list().contains(class))
    }

    fn set_root_class(&self, class: &str, on: bool) {
        if let Some(root) = document().ok().and_then(|doc| doc.document_element()) {
            let _ = if on {
                root.class_list().add_1(class)
            } else {
                root.class_list().remove_1(class)
            };
        }
    }

    fn media_matches(&self, query: &str) -> Result<bool, HostError> {
        media_matches(query)
    }
}
