//! Install coordinator configuration.
//!
//! A [`PwaConfig`] is built once by laying caller-supplied [`PwaOverrides`]
//! over the defaults and validating the result. It is never mutated after
//! that point.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DAY_MS, PROMPT_KEY_SUFFIX, TIMEOUT_KEY_SUFFIX};

/// Errors raised when a merged configuration cannot be used.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("appName must be a non-empty identifier")]
    MissingAppName,
    #[error("reminderDays must be a finite, non-negative number (got {0})")]
    InvalidReminderDays(f64),
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("invalid configuration object: {0}")]
    Malformed(String),
}

/// Fully merged install coordinator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PwaConfig {
    #[serde(default = "PwaConfig::default_enabled", alias = "isPWA")]
    pub enabled: bool,
    #[serde(default = "PwaConfig::default_app_name", alias = "pwaName")]
    pub app_name: String,
    #[serde(default = "PwaConfig::default_reminder_days", alias = "pwaRemind")]
    pub reminder_days: f64,
    #[serde(
        default = "PwaConfig::default_service_worker_url",
        alias = "pwaLocation"
    )]
    pub service_worker_url: String,
    #[serde(default = "PwaConfig::default_service_worker_scope", alias = "pwaScope")]
    pub service_worker_scope: String,
    #[serde(default, alias = "pwaNoCache")]
    pub clear_cache_on_load: bool,
    #[serde(default = "PwaConfig::default_android_prompt_selector")]
    pub android_prompt_selector: String,
    #[serde(default = "PwaConfig::default_ios_prompt_selector")]
    pub ios_prompt_selector: String,
    #[serde(default = "PwaConfig::default_dismiss_button_selector")]
    pub dismiss_button_selector: String,
    #[serde(default = "PwaConfig::default_install_button_selector")]
    pub install_button_selector: String,
    #[serde(default = "PwaConfig::default_menu_hider_selector")]
    pub menu_hider_selector: String,
}

impl PwaConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_app_name() -> String {
        "QuoVadis".to_string()
    }

    const fn default_reminder_days() -> f64 {
        1.0
    }

    fn default_service_worker_url() -> String {
        "/service-worker.js".to_string()
    }

    fn default_service_worker_scope() -> String {
        "/".to_string()
    }

    fn default_android_prompt_selector() -> String {
        "#menu-install-pwa-android".to_string()
    }

    fn default_ios_prompt_selector() -> String {
        "#menu-install-pwa-ios".to_string()
    }

    fn default_dismiss_button_selector() -> String {
        ".pwa-dismiss".to_string()
    }

    fn default_install_button_selector() -> String {
        ".pwa-install".to_string()
    }

    fn default_menu_hider_selector() -> String {
        ".menu-hider".to_string()
    }

    /// Lay `overrides` over `self`; every field present in the overrides wins.
    #[must_use]
    pub fn merged(self, overrides: PwaOverrides) -> Self {
        Self {
            enabled: overrides.enabled.unwrap_or(self.enabled),
            app_name: overrides.app_name.unwrap_or(self.app_name),
            reminder_days: overrides.reminder_days.unwrap_or(self.reminder_days),
            service_worker_url: overrides
                .service_worker_url
                .unwrap_or(self.service_worker_url),
            service_worker_scope: overrides
                .service_worker_scope
                .unwrap_or(self.service_worker_scope),
            clear_cache_on_load: overrides
                .clear_cache_on_load
                .unwrap_or(self.clear_cache_on_load),
            android_prompt_selector: overrides
                .android_prompt_selector
                .unwrap_or(self.android_prompt_selector),
            ios_prompt_selector: overrides
                .ios_prompt_selector
                .unwrap_or(self.ios_prompt_selector),
            dismiss_button_selector: overrides
                .dismiss_button_selector
                .unwrap_or(self.dismiss_button_selector),
            install_button_selector: overrides
                .install_button_selector
                .unwrap_or(self.install_button_selector),
            menu_hider_selector: overrides
                .menu_hider_selector
                .unwrap_or(self.menu_hider_selector),
        }
    }

    /// Check the fields the coordinator depends on.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first field that is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        if !self.reminder_days.is_finite() || self.reminder_days < 0.0 {
            return Err(ConfigError::InvalidReminderDays(self.reminder_days));
        }
        if self.service_worker_url.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "serviceWorkerUrl",
            });
        }
        let selectors = [
            ("androidPromptSelector", &self.android_prompt_selector),
            ("iosPromptSelector", &self.ios_prompt_selector),
            ("dismissButtonSelector", &self.dismiss_button_selector),
            ("installButtonSelector", &self.install_button_selector),
            ("menuHiderSelector", &self.menu_hider_selector),
        ];
        for (field, value) in selectors {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }
        Ok(())
    }

    /// Length of the dismissal cooldown in milliseconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn cooldown_ms(&self) -> i64 {
        (self.reminder_days * DAY_MS as f64).round() as i64
    }

    /// Storage key holding the last reset-eligibility timestamp.
    #[must_use]
    pub fn timeout_key(&self) -> String {
        format!("{}{TIMEOUT_KEY_SUFFIX}", self.app_name)
    }

    /// Storage key holding the prompt rejection flag.
    #[must_use]
    pub fn prompt_key(&self) -> String {
        format!("{}{PROMPT_KEY_SUFFIX}", self.app_name)
    }

    /// Selectors of every surface that a dismissal hides.
    #[must_use]
    pub fn surface_selectors(&self) -> [&str; 3] {
        [
            self.android_prompt_selector.as_str(),
            self.ios_prompt_selector.as_str(),
            self.menu_hider_selector.as_str(),
        ]
    }
}

impl Default for PwaConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            app_name: Self::default_app_name(),
            reminder_days: Self::default_reminder_days(),
            service_worker_url: Self::default_service_worker_url(),
            service_worker_scope: Self::default_service_worker_scope(),
            clear_cache_on_load: false,
            android_prompt_selector: Self::default_android_prompt_selector(),
            ios_prompt_selector: Self::default_ios_prompt_selector(),
            dismiss_button_selector: Self::default_dismiss_button_selector(),
            install_button_selector: Self::default_install_button_selector(),
            menu_hider_selector: Self::default_menu_hider_selector(),
        }
    }
}

/// Caller-supplied overrides. Absent fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PwaOverrides {
    #[serde(default, alias = "isPWA", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, alias = "pwaName", skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, alias = "pwaRemind", skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<f64>,
    #[serde(default, alias = "pwaLocation", skip_serializing_if = "Option::is_none")]
    pub service_worker_url: Option<String>,
    #[serde(default, alias = "pwaScope", skip_serializing_if = "Option::is_none")]
    pub service_worker_scope: Option<String>,
    #[serde(default, alias = "pwaNoCache", skip_serializing_if = "Option::is_none")]
    pub clear_cache_on_load: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_prompt_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_prompt_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_button_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_hider_selector: Option<String>,
}

impl PwaOverrides {
    /// Parse overrides from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] when the text is not a valid
    /// overrides object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Merge onto the defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of the merged configuration.
    pub fn resolve(self) -> Result<PwaConfig, ConfigError> {
        let config = PwaConfig::default().merged(self);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PwaConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.app_name, "QuoVadis");
        assert!((cfg.reminder_days - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.service_worker_url, "/service-worker.js");
        assert_eq!(cfg.service_worker_scope, "/");
        assert!(!cfg.clear_cache_on_load);
        assert_eq!(cfg.android_prompt_selector, "#menu-install-pwa-android");
        assert_eq!(cfg.ios_prompt_selector, "#menu-install-pwa-ios");
        assert_eq!(cfg.dismiss_button_selector, ".pwa-dismiss");
        assert_eq!(cfg.install_button_selector, ".pwa-install");
        assert_eq!(cfg.menu_hider_selector, ".menu-hider");
    }

    #[test]
    fn overrides_win_and_absent_fields_keep_defaults() {
        let overrides = PwaOverrides {
            app_name: Some("Demo".into()),
            reminder_days: Some(3.0),
            ..PwaOverrides::default()
        };
        let cfg = overrides.resolve().unwrap();
        assert_eq!(cfg.app_name, "Demo");
        assert_eq!(cfg.cooldown_ms(), 3 * DAY_MS);
        assert_eq!(cfg.service_worker_scope, "/");
    }

    #[test]
    fn legacy_key_names_are_accepted() {
        let overrides = PwaOverrides::from_json(
            r#"{"isPWA": false, "pwaName": "Legacy", "pwaRemind": 2, "pwaNoCache": true}"#,
        )
        .unwrap();
        let cfg = overrides.resolve().unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.app_name, "Legacy");
        assert!(cfg.clear_cache_on_load);
        assert_eq!(cfg.cooldown_ms(), 2 * DAY_MS);
    }

    #[test]
    fn empty_app_name_is_rejected() {
        let overrides = PwaOverrides {
            app_name: Some("   ".into()),
            ..PwaOverrides::default()
        };
        assert_eq!(overrides.resolve(), Err(ConfigError::MissingAppName));
    }

    #[test]
    fn negative_reminder_is_rejected() {
        let overrides = PwaOverrides {
            reminder_days: Some(-1.0),
            ..PwaOverrides::default()
        };
        assert_eq!(
            overrides.resolve(),
            Err(ConfigError::InvalidReminderDays(-1.0))
        );
    }

    #[test]
    fn empty_selector_is_rejected() {
        let overrides = PwaOverrides {
            menu_hider_selector: Some(String::new()),
            ..PwaOverrides::default()
        };
        assert_eq!(
            overrides.resolve(),
            Err(ConfigError::EmptyField {
                field: "menuHiderSelector"
            })
        );
    }

    #[test]
    fn storage_keys_are_namespaced_by_app() {
        let cfg = PwaOverrides {
            app_name: Some("Demo".into()),
            ..PwaOverrides::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(cfg.timeout_key(), "Demo-PWA-Timeout-Value");
        assert_eq!(cfg.prompt_key(), "Demo-PWA-Prompt");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = PwaOverrides::from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
