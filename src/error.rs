use std::fmt;

use thiserror::Error;

use crate::parser::ParseFailure;

/// Main error type for the recommendation core
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Empty completion from {0}")]
    EmptyCompletion(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseFailure),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("All AI providers failed. Errors: {}", join_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl AdvisorError {
    /// Whether the error came from talking to a backend (network, auth, quota, bad response).
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            AdvisorError::Http(_)
                | AdvisorError::Api { .. }
                | AdvisorError::RateLimit { .. }
                | AdvisorError::EmptyCompletion(_)
                | AdvisorError::Serialization(_)
                | AdvisorError::Timeout(_)
        )
    }

    /// Get the error code used in diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            AdvisorError::Config(_) => "CONFIG_ERROR",
            AdvisorError::Http(_) => "HTTP_ERROR",
            AdvisorError::Api { .. } => "API_ERROR",
            AdvisorError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            AdvisorError::EmptyCompletion(_) => "EMPTY_COMPLETION",
            AdvisorError::Serialization(_) => "SERIALIZATION_ERROR",
            AdvisorError::Parse(_) => "PARSE_ERROR",
            AdvisorError::Timeout(_) => "TIMEOUT_ERROR",
            AdvisorError::AllProvidersFailed(_) => "ALL_PROVIDERS_FAILED",
            AdvisorError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Failures recorded by the orchestrator, if this is an exhaustion error.
    pub fn provider_failures(&self) -> &[ProviderFailure] {
        match self {
            AdvisorError::AllProvidersFailed(failures) => failures,
            _ => &[],
        }
    }
}

/// One provider's failed attempt within a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider_name: String,
    pub reason: String,
}

impl ProviderFailure {
    pub fn new(provider_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider_name, self.reason)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_lists_every_provider() {
        let err = AdvisorError::AllProvidersFailed(vec![
            ProviderFailure::new("HuggingFace (llama)", "HTTP 500"),
            ProviderFailure::new("Gemini (flash)", "quota exhausted"),
        ]);

        let message = err.to_string();
        assert!(message.starts_with("All AI providers failed."));
        assert!(message.contains("HuggingFace (llama): HTTP 500"));
        assert!(message.contains("Gemini (flash): quota exhausted"));
        assert_eq!(err.error_code(), "ALL_PROVIDERS_FAILED");
        assert_eq!(err.provider_failures().len(), 2);
    }

    #[test]
    fn test_empty_provider_list_message() {
        let err = AdvisorError::AllProvidersFailed(Vec::new());
        assert!(err.to_string().contains("no providers configured"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(AdvisorError::RateLimit { retry_after: 3 }.is_transport_failure());
        assert!(AdvisorError::Timeout("slow".to_string()).is_transport_failure());
        assert!(!AdvisorError::Config("missing key".to_string()).is_transport_failure());
        assert!(!AdvisorError::Parse(ParseFailure::Empty).is_transport_failure());
    }
}
