//! Mobile platform detection for the install flows.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ANDROID_UA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)android").expect("valid regex"));
static IOS_UA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)iphone|ipad|ipod").expect("valid regex"));

/// Platform whose install flow applies to the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Native install-eligibility signal, custom prompt re-triggers it.
    Android,
    /// No native install API; the custom prompt carries instructions only.
    Ios,
}

impl Platform {
    /// Classify a user agent. Android is checked first; desktop agents yield `None`.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Option<Self> {
        if ANDROID_UA.is_match(user_agent) {
            Some(Self::Android)
        } else if IOS_UA.is_match(user_agent) {
            Some(Self::Ios)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

/// Outcome of probing the host for the install flow to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProbe {
    pub platform: Option<Platform>,
    /// Whether the native eligibility event can fire at all.
    pub native_prompt: bool,
}

impl PlatformProbe {
    /// Combine user-agent matching with the host's capability report.
    ///
    /// A host that reports no native install event never gets the Android
    /// eligibility listener, even when its user agent says Android. When the
    /// host cannot tell, the user agent decides.
    #[must_use]
    pub fn detect(user_agent: Option<&str>, supports_install_prompt: Option<bool>) -> Self {
        let platform = user_agent.and_then(Platform::from_user_agent);
        let native_prompt = match platform {
            Some(Platform::Android) => supports_install_prompt.unwrap_or(true),
            Some(Platform::Ios) | None => supports_install_prompt.unwrap_or(false),
        };
        Self {
            platform,
            native_prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Mobile Safari/537.36";
    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X)";
    const DESKTOP: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0";

    #[test]
    fn classifies_mobile_agents() {
        assert_eq!(Platform::from_user_agent(PIXEL), Some(Platform::Android));
        assert_eq!(Platform::from_user_agent(IPHONE), Some(Platform::Ios));
        assert_eq!(Platform::from_user_agent(IPAD), Some(Platform::Ios));
        assert_eq!(Platform::from_user_agent("ipod touch"), Some(Platform::Ios));
    }

    #[test]
    fn desktop_agents_have_no_flow() {
        assert_eq!(Platform::from_user_agent(DESKTOP), None);
        assert_eq!(PlatformProbe::detect(None, Some(true)).platform, None);
    }

    #[test]
    fn capability_report_gates_native_prompt() {
        let probe = PlatformProbe::detect(Some(PIXEL), Some(false));
        assert_eq!(probe.platform, Some(Platform::Android));
        assert!(!probe.native_prompt);

        let probe = PlatformProbe::detect(Some(PIXEL), None);
        assert!(probe.native_prompt);

        let probe = PlatformProbe::detect(Some(IPHONE), None);
        assert_eq!(probe.platform, Some(Platform::Ios));
        assert!(!probe.native_prompt);
    }

    #[test]
    fn native_prompt_support_never_picks_the_platform() {
        let probe = PlatformProbe::detect(Some(DESKTOP), Some(true));
        assert_eq!(probe.platform, None);

        let probe = PlatformProbe::detect(Some(IPHONE), Some(true));
        assert_eq!(probe.platform, Some(Platform::Ios));
    }
}
