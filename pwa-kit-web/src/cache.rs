//! Cache Storage inspector/cleaner exposed to JavaScript as `cacheManager` helpers.

use js_sys::{Array, Reflect};
use pwa_kit_core::{
    CacheError, CacheStore, PurgeReport, StorageInfo, list_cached_files, purge_all,
};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, CacheStorage, Request};

use crate::dom::{has_property, js_error_message, window};

/// The page's `caches` object.
pub struct BrowserCaches {
    storage: CacheStorage,
}

impl BrowserCaches {
    /// # Errors
    /// Returns [`CacheError::Unsupported`] when the Cache API is missing.
    pub fn open() -> Result<Self, CacheError> {
        let win = window().map_err(|_| CacheError::Unsupported)?;
        if !has_property(&win, "caches") {
            return Err(CacheError::Unsupported);
        }
        win.caches()
            .map(|storage| Self { storage })
            .map_err(|_| CacheError::Unsupported)
    }
}

impl CacheStore for BrowserCaches {
    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let names = JsFuture::from(self.storage.keys())
            .await
            .map_err(|e| CacheError::Enumerate(js_error_message(&e)))?;
        Ok(Array::from(&names)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.storage.delete(name))
            .await
            .map_err(|e| CacheError::Delete {
                name: name.to_string(),
                message: js_error_message(&e),
            })?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn cached_urls(&self, name: &str) -> Result<Vec<String>, CacheError> {
        let read_error = |e: JsValue| CacheError::Read {
            name: name.to_string(),
            message: js_error_message(&e),
        };
        let cache = JsFuture::from(self.storage.open(name))
            .await
            .map_err(read_error)?
            .dyn_into::<Cache>()
            .map_err(read_error)?;
        let requests = JsFuture::from(cache.keys()).await.map_err(read_error)?;
        Ok(Array::from(&requests)
            .iter()
            .filter_map(|request| request.dyn_into::<Request>().ok())
            .map(|request| request.url())
            .collect())
    }
}

/// Query `navigator.storage.estimate()`.
///
/// Returns `None` when the Storage API is missing or the estimate fails;
/// both cases are logged.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn storage_info() -> Option<StorageInfo> {
    let navigator = window().ok()?.navigator();
    if !has_property(&navigator, "storage") || !has_property(&navigator.storage(), "estimate") {
        log::warn!("Storage API or estimate not available.");
        return None;
    }
    let estimate = match navigator.storage().estimate() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(err) => Err(err),
    };
    match estimate {
        Ok(estimate) => {
            let field = |name: &str| {
                Reflect::get(&estimate, &JsValue::from_str(name))
                    .ok()
                    .and_then(|v| v.as_f64())
            };
            Some(StorageInfo::from_estimate(field("usage"), field("quota")))
        }
        Err(err) => {
            log::error!("Error getting storage estimate: {}", js_error_message(&err));
            None
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

/// `getStorageInfo()`: usage summary object, or `null`.
#[wasm_bindgen(js_name = getStorageInfo)]
pub async fn get_storage_info() -> JsValue {
    storage_info()
        .await
        .map_or(JsValue::NULL, |info| to_js(&info))
}

/// What `clearCache` reports, and whether the page should reload after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClearVerdict {
    cleared: bool,
    reload: bool,
}

fn clear_verdict(
    purge: &Result<PurgeReport, CacheError>,
    reload_page: Option<bool>,
) -> ClearVerdict {
    let cleared = match purge {
        Ok(report) if report.is_clean() => {
            log::info!("All caches cleared ({})", report.deleted.len());
            true
        }
        Ok(report) => {
            log::error!("Error clearing cache: {} deletion(s) failed", report.failed.len());
            false
        }
        Err(err) => {
            log::error!("Error clearing cache: {err}");
            false
        }
    };
    ClearVerdict {
        cleared,
        reload: cleared && reload_page.unwrap_or(true),
    }
}

/// `clearCache(reloadPage = true)`: delete every cache; `true` on full success.
#[wasm_bindgen(js_name = clearCache)]
pub async fn clear_cache(reload_page: Option<bool>) -> bool {
    let caches = match BrowserCaches::open() {
        Ok(caches) => caches,
        Err(err) => {
            log::warn!("{err}. Cannot clear cache.");
            return false;
        }
    };
    let verdict = clear_verdict(&purge_all(&caches).await, reload_page);
    if verdict.reload {
        if let Ok(win) = window() {
            let _ = win.location().reload();
        }
    }
    verdict.cleared
}

/// `logStorageUsage()`: log the usage summary at info level.
#[wasm_bindgen(js_name = logStorageUsage)]
pub async fn log_storage_usage() {
    if let Some(info) = storage_info().await {
        log::info!("{}", info.usage_line());
    }
}

/// `listCachedFiles()`: `[{ cache, urls }]` for every cache.
#[wasm_bindgen(js_name = listCachedFiles)]
pub async fn list_cached_files_js() -> JsValue {
    let caches = match BrowserCaches::open() {
        Ok(caches) => caches,
        Err(err) => {
            log::warn!("{err}. Cannot list cached files.");
            return to_js(&Vec::<()>::new());
        }
    };
    match list_cached_files(&caches).await {
        Ok(listings) => to_js(&listings),
        Err(err) => {
            log::error!("Error listing cached files: {err}");
            to_js(&Vec::<()>::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(deleted: &[&str], failed: &[&str]) -> PurgeReport {
        PurgeReport {
            deleted: deleted.iter().map(ToString::to_string).collect(),
            missing: Vec::new(),
            failed: failed
                .iter()
                .map(|name| CacheError::Delete {
                    name: (*name).to_string(),
                    message: "QuotaExceededError".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn full_purge_reloads_unless_told_not_to() {
        let clean = Ok(report(&["static-v1", "api-v1"], &[]));
        assert_eq!(
            clear_verdict(&clean, None),
            ClearVerdict {
                cleared: true,
                reload: true
            }
        );
        assert_eq!(
            clear_verdict(&clean, Some(false)),
            ClearVerdict {
                cleared: true,
                reload: false
            }
        );
    }

    #[test]
    fn failed_deletion_reports_false_and_keeps_the_page() {
        let partial = Ok(report(&["static-v1"], &["images-v1"]));
        assert_eq!(
            clear_verdict(&partial, Some(true)),
            ClearVerdict {
                cleared: false,
                reload: false
            }
        );

        let unlisted = Err(CacheError::Enumerate("SecurityError".into()));
        assert!(!clear_verdict(&unlisted, None).reload);
        assert!(!clear_verdict(&unlisted, None).cleared);
    }
}
