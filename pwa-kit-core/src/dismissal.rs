//! Persisted dismissal state and the reminder cooldown.
//!
//! Two keys per app survive reloads: the timestamp of the last
//! reset-eligibility check and the rejection flag. While the flag is set and
//! the cooldown has not elapsed, no custom prompt may be shown.

use serde::Serialize;

use crate::config::PwaConfig;
use crate::constants::INSTALL_REJECTED;
use crate::host::{HostError, KeyValueStore};

/// Result of reconciling the cooldown at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CooldownStatus {
    /// No usable timestamp was stored; the current time was written.
    Seeded,
    /// The cooldown window is still open; nothing changed.
    Running,
    /// The window elapsed; the rejection was cleared and the timestamp reset.
    Expired,
}

/// Snapshot of the persisted dismissal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DismissalState {
    pub timeout_value: Option<i64>,
    pub rejected: bool,
}

/// Reads and writes the dismissal keys for one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DismissalLedger {
    timeout_key: String,
    prompt_key: String,
    cooldown_ms: i64,
}

impl DismissalLedger {
    #[must_use]
    pub fn for_config(config: &PwaConfig) -> Self {
        Self {
            timeout_key: config.timeout_key(),
            prompt_key: config.prompt_key(),
            cooldown_ms: config.cooldown_ms(),
        }
    }

    #[must_use]
    pub fn timeout_key(&self) -> &str {
        &self.timeout_key
    }

    #[must_use]
    pub fn prompt_key(&self) -> &str {
        &self.prompt_key
    }

    /// Read both keys. An unparseable timestamp reads as absent.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn state<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<DismissalState, HostError> {
        let timeout_value = store
            .get(&self.timeout_key)?
            .and_then(|raw| raw.trim().parse::<i64>().ok());
        let rejected = store
            .get(&self.prompt_key)?
            .is_some_and(|v| v == INSTALL_REJECTED);
        Ok(DismissalState {
            timeout_value,
            rejected,
        })
    }

    /// Whether the user has declined installation and the rejection still stands.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn is_rejected<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<bool, HostError> {
        Ok(self.state(store)?.rejected)
    }

    /// Seed the timestamp, or clear an expired rejection.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn reconcile<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        now_ms: i64,
    ) -> Result<CooldownStatus, HostError> {
        let Some(last_check) = self.state(store)?.timeout_value else {
            store.set(&self.timeout_key, &now_ms.to_string())?;
            return Ok(CooldownStatus::Seeded);
        };

        if now_ms.saturating_sub(last_check) > self.cooldown_ms {
            store.remove(&self.prompt_key)?;
            store.set(&self.timeout_key, &now_ms.to_string())?;
            Ok(CooldownStatus::Expired)
        } else {
            Ok(CooldownStatus::Running)
        }
    }

    /// Persist a rejection starting at `now_ms`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn record_rejection<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        now_ms: i64,
    ) -> Result<(), HostError> {
        store.set(&self.timeout_key, &now_ms.to_string())?;
        store.set(&self.prompt_key, INSTALL_REJECTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PwaOverrides;
    use crate::constants::DAY_MS;
    use crate::testing::MemoryHost;

    fn ledger(app: &str, days: f64) -> DismissalLedger {
        let cfg = PwaOverrides {
            app_name: Some(app.into()),
            reminder_days: Some(days),
            ..PwaOverrides::default()
        }
        .resolve()
        .unwrap();
        DismissalLedger::for_config(&cfg)
    }

    #[test]
    fn first_reconcile_seeds_timestamp() {
        let host = MemoryHost::new();
        let ledger = ledger("Demo", 1.0);
        assert_eq!(ledger.reconcile(&host, 0).unwrap(), CooldownStatus::Seeded);
        assert_eq!(host.stored("Demo-PWA-Timeout-Value").as_deref(), Some("0"));
    }

    #[test]
    fn expired_window_clears_rejection() {
        let host = MemoryHost::new();
        let ledger = ledger("Demo", 1.0);
        ledger.record_rejection(&host, 0).unwrap();
        assert!(ledger.is_rejected(&host).unwrap());

        assert_eq!(
            ledger.reconcile(&host, 90_000_000).unwrap(),
            CooldownStatus::Expired
        );
        assert!(!ledger.is_rejected(&host).unwrap());
        assert_eq!(
            host.stored("Demo-PWA-Timeout-Value").as_deref(),
            Some("90000000")
        );
    }

    #[test]
    fn window_boundary_is_exclusive() {
        let host = MemoryHost::new();
        let ledger = ledger("Demo", 1.0);
        ledger.record_rejection(&host, 1_000).unwrap();
        assert_eq!(
            ledger.reconcile(&host, 1_000 + DAY_MS).unwrap(),
            CooldownStatus::Running
        );
        assert!(ledger.is_rejected(&host).unwrap());
    }

    #[test]
    fn garbage_timestamp_is_reseeded() {
        let host = MemoryHost::new();
        host.seed_storage("Demo-PWA-Timeout-Value", "not-a-number");
        let ledger = ledger("Demo", 1.0);
        assert_eq!(ledger.reconcile(&host, 42).unwrap(), CooldownStatus::Seeded);
        assert_eq!(host.stored("Demo-PWA-Timeout-Value").as_deref(), Some("42"));
    }

    #[test]
    fn other_prompt_values_are_not_rejections() {
        let host = MemoryHost::new();
        host.seed_storage("Demo-PWA-Prompt", "maybe-later");
        assert!(!ledger("Demo", 1.0).is_rejected(&host).unwrap());
    }
}
