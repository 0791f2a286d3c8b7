use serde::{Deserialize, Serialize};

use super::recommendation::TravelRecommendation;
use crate::error::ProviderFailure;

/// Provider label reported when no backend produced an answer.
pub const ALL_FAILED_PROVIDER: &str = "None (all failed)";

/// How the recommendation in a response was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrigin {
    /// Model output parsed into a structured plan
    Parsed,
    /// Model answered but the text could not be structured
    RawText,
    /// Every provider failed
    #[default]
    Fallback,
}

/// What the boundary hands back to its caller.
///
/// Serializes as `{explanation, places, closing?, provider}`; diagnostics stay
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorResponse {
    #[serde(flatten)]
    pub recommendation: TravelRecommendation,
    pub provider: String,
    #[serde(skip)]
    pub origin: ResponseOrigin,
    #[serde(skip)]
    pub failures: Vec<ProviderFailure>,
}

impl AdvisorResponse {
    pub fn new(
        recommendation: TravelRecommendation,
        provider: impl Into<String>,
        origin: ResponseOrigin,
    ) -> Self {
        Self {
            recommendation,
            provider: provider.into(),
            origin,
            failures: Vec::new(),
        }
    }

    /// The Fallback Plan tagged with the all-failed provider label.
    pub fn fallback(failures: Vec<ProviderFailure>) -> Self {
        Self {
            recommendation: TravelRecommendation::fallback().clone(),
            provider: ALL_FAILED_PROVIDER.to_string(),
            origin: ResponseOrigin::Fallback,
            failures,
        }
    }

    pub fn with_failures(mut self, failures: Vec<ProviderFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == ResponseOrigin::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_response_shape() {
        let response = AdvisorResponse::fallback(vec![ProviderFailure::new("p", "boom")]);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["provider"], ALL_FAILED_PROVIDER);
        assert_eq!(value["places"], serde_json::json!([]));
        assert!(!value["explanation"].as_str().unwrap().is_empty());
        assert!(value.get("failures").is_none());
        assert!(value.get("origin").is_none());
        assert!(response.recommendation.is_fallback());
    }
}
