//! Process-wide configuration, read once at startup.

use std::{env, fmt, str::FromStr, time::Duration};

use crate::error::{AdvisorError, Result};

pub const DEFAULT_HUGGINGFACE_BASE_URL: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_HUGGINGFACE_MODEL: &str = "meta-llama/Llama-3.2-3B-Instruct";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 3072;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// The backends this crate can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    HuggingFace,
    Gemini,
}

impl FromStr for ProviderKind {
    type Err = AdvisorError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(AdvisorError::Config(format!(
                "unknown provider `{other}` (expected `huggingface` or `gemini`)"
            ))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HuggingFace => write!(f, "huggingface"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// What to do when a provider answers but the text cannot be structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Show the raw text as the explanation, with no places.
    #[default]
    Degrade,
    /// Treat it like a transport failure and try the next provider.
    AdvanceChain,
}

/// Connection settings for one provider.
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl ProviderSettings {
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: base_url.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn huggingface() -> Self {
        Self::new(DEFAULT_HUGGINGFACE_MODEL, DEFAULT_HUGGINGFACE_BASE_URL)
    }

    pub fn gemini() -> Self {
        Self::new(DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_BASE_URL)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// The credential, if one is configured and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key().map(|_| "***"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub huggingface: ProviderSettings,
    pub gemini: ProviderSettings,
    /// Preference order; the first entry is the primary provider.
    pub provider_order: Vec<ProviderKind>,
    /// Deadline for a single provider attempt; `None` waits indefinitely.
    pub attempt_timeout: Option<Duration>,
    pub parse_failure_policy: ParseFailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            huggingface: ProviderSettings::huggingface(),
            gemini: ProviderSettings::gemini(),
            provider_order: vec![ProviderKind::HuggingFace, ProviderKind::Gemini],
            attempt_timeout: Some(DEFAULT_ATTEMPT_TIMEOUT),
            parse_failure_policy: ParseFailurePolicy::Degrade,
        }
    }
}

impl Settings {
    /// Read settings from the environment. Missing credentials are not an error.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        settings.huggingface.api_key = env::var("HUGGINGFACE_API_KEY").ok();
        if let Ok(model) = env::var("HUGGINGFACE_MODEL") {
            settings.huggingface.model = model;
        }
        if let Ok(base_url) = env::var("HUGGINGFACE_BASE_URL") {
            settings.huggingface.base_url = base_url;
        }

        settings.gemini.api_key = env::var("GOOGLE_GENERATIVE_AI_API_KEY").ok();
        if let Ok(model) = env::var("GEMINI_MODEL") {
            settings.gemini.model = model;
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            settings.gemini.base_url = base_url;
        }

        if let Ok(order) = env::var("TRIPCAST_PROVIDERS") {
            settings.provider_order = parse_provider_order(&order)?;
        }

        if let Ok(seconds) = env::var("TRIPCAST_TIMEOUT_SECS") {
            let seconds: u64 = seconds.trim().parse().map_err(|_| {
                AdvisorError::Config(format!(
                    "TRIPCAST_TIMEOUT_SECS must be a whole number of seconds, got `{seconds}`"
                ))
            })?;
            settings.attempt_timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        }

        if let Ok(strict) = env::var("TRIPCAST_STRICT_PARSING") {
            if is_truthy(&strict) {
                settings.parse_failure_policy = ParseFailurePolicy::AdvanceChain;
            }
        }

        Ok(settings)
    }

    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::HuggingFace => &self.huggingface,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    pub fn with_provider_order(mut self, order: Vec<ProviderKind>) -> Self {
        self.provider_order = order;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_parse_failure_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.parse_failure_policy = policy;
        self
    }
}

/// Parse a comma-separated provider list such as `gemini,huggingface`.
pub fn parse_provider_order(value: &str) -> Result<Vec<ProviderKind>> {
    value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(ProviderKind::from_str)
        .collect()
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_order_parsing() {
        assert_eq!(
            parse_provider_order("gemini, HuggingFace").unwrap(),
            vec![ProviderKind::Gemini, ProviderKind::HuggingFace]
        );
        assert_eq!(parse_provider_order("hf,,").unwrap(), vec![ProviderKind::HuggingFace]);

        let err = parse_provider_order("gemini,openai").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let settings = ProviderSettings::gemini().with_api_key("   ");
        assert_eq!(settings.api_key(), None);
        assert_eq!(
            ProviderSettings::gemini().with_api_key(" key ").api_key(),
            Some("key")
        );
    }

    #[test]
    fn test_debug_masks_credentials() {
        let settings = ProviderSettings::huggingface().with_api_key("hf_secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hf_secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_defaults_prefer_huggingface() {
        let settings = Settings::default();
        assert_eq!(settings.provider_order[0], ProviderKind::HuggingFace);
        assert_eq!(settings.attempt_timeout, Some(Duration::from_secs(60)));
        assert_eq!(settings.parse_failure_policy, ParseFailurePolicy::Degrade);
        assert_eq!(settings.provider(ProviderKind::Gemini).model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" 1 "));
        assert!(!is_truthy("no"));
    }
}
