//! Single-use holder for the browser's install-eligibility signal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The user's answer to the native install prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOutcome {
    Accepted,
    Dismissed,
}

impl FromStr for InstallOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(format!("unknown install outcome '{other}'")),
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::Dismissed => "dismissed",
        })
    }
}

/// Owns a captured eligibility signal until its first use.
///
/// [`DeferredPrompt::take`] hands the signal out exactly once; every later
/// call yields `None`, so the native prompt can never be invoked twice.
#[derive(Debug)]
pub struct DeferredPrompt<S> {
    signal: Option<S>,
}

impl<S> DeferredPrompt<S> {
    #[must_use]
    pub const fn empty() -> Self {
        Self { signal: None }
    }

    /// Store a freshly captured signal, dropping any unused predecessor.
    pub fn capture(&mut self, signal: S) {
        self.signal = Some(signal);
    }

    /// Consume the signal.
    pub fn take(&mut self) -> Option<S> {
        self.signal.take()
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.signal.is_some()
    }
}

impl<S> Default for DeferredPrompt<S> {
    fn default() -> Self {
        Self::empty()
    }
}
