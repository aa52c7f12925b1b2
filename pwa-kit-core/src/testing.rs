//! In-memory host used by the unit tests and the QA tester.
//!
//! Elements are keyed by the exact selector used to query them. Wiring calls
//! are recorded in order instead of attaching real listeners; tests drive
//! the resulting callbacks by calling the coordinator directly.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::cache::{CacheError, CacheStore};
use crate::host::{BrowserProbe, Clock, DomSurface, HostError, InstallWiring, KeyValueStore};
use crate::platform::Platform;

/// A wiring call recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wiring {
    ServiceWorker { url: String, scope: String },
    DismissButtons(String),
    InstallSignalListener,
    InstallButtons { selector: String, within: String },
    AppInstalledListener,
    PromptTimer(Platform, u32),
    CachePurge,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    storage: RefCell<BTreeMap<String, String>>,
    storage_writes: Cell<usize>,
    now: Cell<i64>,
    elements: RefCell<BTreeMap<String, BTreeSet<String>>>,
    root_classes: RefCell<BTreeSet<String>>,
    dom_mutations: Cell<usize>,
    media: BTreeMap<String, bool>,
    user_agent: Option<String>,
    native_prompt: Option<bool>,
    dismiss_buttons: usize,
    install_buttons: usize,
    missing: BTreeSet<&'static str>,
    wiring: RefCell<Vec<Wiring>>,
    caches: RefCell<BTreeMap<String, Vec<String>>>,
    failing_deletes: BTreeSet<String>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    #[must_use]
    pub fn with_native_prompt(mut self, supported: Option<bool>) -> Self {
        self.native_prompt = supported;
        self
    }

    /// Add elements, each reachable by the given selector.
    #[must_use]
    pub fn with_elements(self, selectors: &[&str]) -> Self {
        {
            let mut elements = self.elements.borrow_mut();
            for selector in selectors {
                elements.entry((*selector).to_string()).or_default();
            }
        }
        self
    }

    #[must_use]
    pub fn with_dismiss_buttons(mut self, count: usize) -> Self {
        self.dismiss_buttons = count;
        self
    }

    /// Install buttons placed inside the Android prompt surface.
    #[must_use]
    pub fn with_install_buttons(mut self, count: usize) -> Self {
        self.install_buttons = count;
        self
    }

    #[must_use]
    pub fn with_media(mut self, query: &str, matches: bool) -> Self {
        self.media.insert(query.to_string(), matches);
        self
    }

    /// Drop a browser capability: `localStorage`, `matchMedia`,
    /// `serviceWorker`, `caches`, or `document`.
    #[must_use]
    pub fn without_capability(mut self, name: &'static str) -> Self {
        self.missing.insert(name);
        self
    }

    #[must_use]
    pub fn with_cache(self, name: &str, urls: &[&str]) -> Self {
        self.caches.borrow_mut().insert(
            name.to_string(),
            urls.iter().map(|u| (*u).to_string()).collect(),
        );
        self
    }

    #[must_use]
    pub fn failing_cache_delete(mut self, name: &str) -> Self {
        self.failing_deletes.insert(name.to_string());
        self
    }

    pub fn set_now(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    /// Write a key without counting it as a host write.
    pub fn seed_storage(&self, key: &str, value: &str) {
        self.storage
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn stored(&self, key: &str) -> Option<String> {
        self.storage.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn storage_writes(&self) -> usize {
        self.storage_writes.get()
    }

    #[must_use]
    pub fn dom_mutations(&self) -> usize {
        self.dom_mutations.get()
    }

    #[must_use]
    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.elements
            .borrow()
            .get(selector)
            .is_some_and(|classes| classes.contains(class))
    }

    #[must_use]
    pub fn wiring(&self) -> Vec<Wiring> {
        self.wiring.borrow().clone()
    }

    #[must_use]
    pub fn cache_names_now(&self) -> Vec<String> {
        self.caches.borrow().keys().cloned().collect()
    }

    fn require(&self, capability: &'static str) -> Result<(), HostError> {
        if self.missing.contains(capability) {
            Err(HostError::Unsupported(capability))
        } else {
            Ok(())
        }
    }

    fn record(&self, wiring: Wiring) {
        self.wiring.borrow_mut().push(wiring);
    }

    fn touch_dom(&self) {
        self.dom_mutations.set(self.dom_mutations.get() + 1);
    }
}

impl KeyValueStore for MemoryHost {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        self.require("localStorage")?;
        Ok(self.stored(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HostError> {
        self.require("localStorage")?;
        self.storage_writes.set(self.storage_writes.get() + 1);
        self.seed_storage(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HostError> {
        self.require("localStorage")?;
        self.storage_writes.set(self.storage_writes.get() + 1);
        self.storage.borrow_mut().remove(key);
        Ok(())
    }
}

impl Clock for MemoryHost {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

impl DomSurface for MemoryHost {
    fn exists(&self, selector: &str) -> bool {
        self.elements.borrow().contains_key(selector)
    }

    fn set_class(&self, selector: &str, class: &str, on: bool) -> bool {
        let mut elements = self.elements.borrow_mut();
        let Some(classes) = elements.get_mut(selector) else {
            return false;
        };
        if on {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
        self.touch_dom();
        true
    }

    fn root_has_class(&self, class: &str) -> bool {
        self.root_classes.borrow().contains(class)
    }

    fn set_root_class(&self, class: &str, on: bool) {
        if on {
            self.root_classes.borrow_mut().insert(class.to_string());
        } else {
            self.root_classes.borrow_mut().remove(class);
        }
        self.touch_dom();
    }

    fn media_matches(&self, query: &str) -> Result<bool, HostError> {
        self.require("matchMedia")?;
        Ok(self.media.get(query).copied().unwrap_or(false))
    }
}

impl BrowserProbe for MemoryHost {
    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn supports_install_prompt(&self) -> Option<bool> {
        self.native_prompt
    }
}

impl InstallWiring for MemoryHost {
    fn register_service_worker_on_load(&self, url: &str, scope: &str) -> Result<(), HostError> {
        self.require("serviceWorker")?;
        self.record(Wiring::ServiceWorker {
            url: url.to_string(),
            scope: scope.to_string(),
        });
        Ok(())
    }

    fn wire_dismiss_buttons(&self, selector: &str) -> Result<usize, HostError> {
        self.require("document")?;
        self.record(Wiring::DismissButtons(selector.to_string()));
        Ok(self.dismiss_buttons)
    }

    fn listen_for_install_signal(&self) -> Result<(), HostError> {
        self.record(Wiring::InstallSignalListener);
        Ok(())
    }

    fn wire_install_buttons(&self, selector: &str, within: &str) -> Result<usize, HostError> {
        self.require("document")?;
        self.record(Wiring::InstallButtons {
            selector: selector.to_string(),
            within: within.to_string(),
        });
        Ok(if self.exists(within) {
            self.install_buttons
        } else {
            0
        })
    }

    fn listen_for_app_installed(&self) -> Result<(), HostError> {
        self.record(Wiring::AppInstalledListener);
        Ok(())
    }

    fn schedule_prompt(&self, platform: Platform, delay_ms: u32) -> Result<(), HostError> {
        self.record(Wiring::PromptTimer(platform, delay_ms));
        Ok(())
    }

    fn purge_caches(&self) -> Result<(), HostError> {
        self.require("caches")?;
        self.record(Wiring::CachePurge);
        Ok(())
    }
}

impl CacheStore for MemoryHost {
    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        if self.missing.contains("caches") {
            return Err(CacheError::Unsupported);
        }
        Ok(self.cache_names_now())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, CacheError> {
        if self.failing_deletes.contains(name) {
            return Err(CacheError::Delete {
                name: name.to_string(),
                message: "QuotaExceededError".to_string(),
            });
        }
        Ok(self.caches.borrow_mut().remove(name).is_some())
    }

    async fn cached_urls(&self, name: &str) -> Result<Vec<String>, CacheError> {
        self.caches
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::Read {
                name: name.to_string(),
                message: "no such cache".to_string(),
            })
    }
}
