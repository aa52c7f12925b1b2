//! Cache Storage inspection and cleanup.

use serde::Serialize;
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
pub enum CacheError {
    #[error("Cache API is not available in this browser")]
    Unsupported,
    #[error("listing caches failed: {0}")]
    Enumerate(String),
    #[error("deleting cache '{name}' failed: {message}")]
    Delete { name: String, message: String },
    #[error("reading cache '{name}' failed: {message}")]
    Read { name: String, message: String },
}

/// Access to the browser's Cache Storage.
#[allow(async_fn_in_trait)] // Wasm futures are single-threaded; no `Send` bound wanted.
pub trait CacheStore {
    /// # Errors
    ///
    /// Returns an error when the cache names cannot be enumerated.
    async fn cache_names(&self) -> Result<Vec<String>, CacheError>;

    /// Delete one cache; `Ok(false)` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Delete`] when the browser rejects the deletion.
    async fn delete_cache(&self, name: &str) -> Result<bool, CacheError>;

    /// Request URLs stored in one cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Read`] when the cache cannot be opened or read.
    async fn cached_urls(&self, name: &str) -> Result<Vec<String>, CacheError>;
}

/// What a purge managed to delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub deleted: Vec<String>,
    /// Names listed but already gone when deleted.
    pub missing: Vec<String>,
    pub failed: Vec<CacheError>,
}

impl PurgeReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every cache, one at a time. A failed deletion is recorded and the
/// remaining caches are still attempted.
///
/// # Errors
///
/// Returns an error only when the cache names cannot be enumerated.
#[allow(clippy::future_not_send)]
pub async fn purge_all<C: CacheStore + ?Sized>(store: &C) -> Result<PurgeReport, CacheError> {
    let names = store.cache_names().await?;
    let mut report = PurgeReport::default();
    for name in names {
        match store.delete_cache(&name).await {
            Ok(true) => {
                log::debug!("deleted cache {name}");
                report.deleted.push(name);
            }
            Ok(false) => report.missing.push(name),
            Err(err) => {
                log::error!("{err}");
                report.failed.push(err);
            }
        }
    }
    Ok(report)
}

/// Contents of one cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheListing {
    pub cache: String,
    pub urls: Vec<String>,
}

/// List the request URLs held by every cache.
///
/// # Errors
///
/// Returns the first enumeration or read failure.
#[allow(clippy::future_not_send)]
pub async fn list_cached_files<C: CacheStore + ?Sized>(
    store: &C,
) -> Result<Vec<CacheListing>, CacheError> {
    let names = store.cache_names().await?;
    log::info!("Found {} cache(s)", names.len());
    let mut listings = Vec::with_capacity(names.len());
    for name in names {
        let urls = store.cached_urls(&name).await?;
        log::info!("Cache: {name} ({} files)", urls.len());
        for url in &urls {
            log::debug!("  - {url}");
        }
        listings.push(CacheListing { cache: name, urls });
    }
    Ok(listings)
}

/// Storage usage derived from a quota estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub used: f64,
    pub available: f64,
    #[serde(rename = "usedMB")]
    pub used_mb: u64,
    #[serde(rename = "availableMB")]
    pub available_mb: u64,
    pub percentage: f64,
    pub percentage_text: String,
}

impl StorageInfo {
    /// Build from the raw `usage`/`quota` fields; absent values count as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_estimate(usage: Option<f64>, quota: Option<f64>) -> Self {
        let used = usage.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0);
        let available = quota.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0);
        let percentage = if available > 0.0 { used / available } else { 0.0 };
        Self {
            used,
            available,
            used_mb: (used / BYTES_PER_MB).round() as u64,
            available_mb: (available / BYTES_PER_MB).round() as u64,
            percentage,
            percentage_text: format!("{}%", (percentage * 100.0).round()),
        }
    }

    #[must_use]
    pub fn usage_line(&self) -> String {
        format!(
            "Cache Usage: {}MB / {}MB ({})",
            self.used_mb, self.available_mb, self.percentage_text
        )
    }
}
