//! Response assembly: the boundary callers talk to.

use tracing::{debug, error, warn};

use super::fallback::{Attempt, FallbackOrchestrator};
use crate::{
    config::{ParseFailurePolicy, Settings},
    error::AdvisorError,
    parser::{self, preview, ParseFailure},
    providers::build_active_providers,
    schemas::{shape_issues, travel_plan_schema},
    types::{AdvisorResponse, Intent, RecommendationRequest, ResponseOrigin, TravelRecommendation},
};

/// Turns a request into a travel plan using whichever provider answers first.
///
/// [`TravelAdvisor::generate_recommendation`] never fails: provider outages
/// yield the fallback plan and unstructurable text is shown as-is.
#[derive(Debug, Clone)]
pub struct TravelAdvisor {
    orchestrator: FallbackOrchestrator,
    parse_policy: ParseFailurePolicy,
}

impl TravelAdvisor {
    pub fn new(orchestrator: FallbackOrchestrator) -> Self {
        Self {
            orchestrator,
            parse_policy: ParseFailurePolicy::default(),
        }
    }

    /// Build the provider chain from configuration. Providers without
    /// credentials are left out.
    pub fn from_settings(settings: &Settings) -> Self {
        let providers = build_active_providers(settings);
        if providers.is_empty() {
            warn!(
                target: "tripcast::advisor",
                "no providers configured; every request will receive the fallback plan"
            );
        }

        let orchestrator =
            FallbackOrchestrator::new(providers).with_attempt_timeout(settings.attempt_timeout);
        Self::new(orchestrator).with_parse_policy(settings.parse_failure_policy)
    }

    pub fn with_parse_policy(mut self, parse_policy: ParseFailurePolicy) -> Self {
        self.parse_policy = parse_policy;
        self
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    pub async fn generate_recommendation(&self, request: &RecommendationRequest) -> AdvisorResponse {
        let parse_policy = self.parse_policy;

        let outcome = self
            .orchestrator
            .run(|provider| async move {
                let raw = match &request.weather {
                    Some(weather) => {
                        provider
                            .generate_weather_recommendation(
                                &request.message,
                                weather,
                                &request.language,
                                &request.context,
                                request.trip_days(),
                            )
                            .await?
                    }
                    None => {
                        provider
                            .generate_chat_reply(&request.message, &request.language, &request.context)
                            .await?
                    }
                };

                let structured = structure(&raw);
                if parse_policy == ParseFailurePolicy::AdvanceChain {
                    if let Err(failure) = &structured {
                        return Err(AdvisorError::Parse(failure.clone()));
                    }
                }
                Ok::<_, AdvisorError>((raw, structured))
            })
            .await;

        match outcome {
            Ok(Attempt {
                value: (raw, structured),
                provider,
                failures,
            }) => match structured {
                Ok(recommendation) => {
                    AdvisorResponse::new(recommendation, provider, ResponseOrigin::Parsed)
                        .with_failures(failures)
                }
                Err(failure) => {
                    warn!(
                        target: "tripcast::advisor",
                        provider = %provider,
                        error = %failure,
                        raw = %preview(&raw),
                        "could not structure model output; returning raw text"
                    );
                    AdvisorResponse::new(
                        TravelRecommendation::from_raw_text(&raw),
                        provider,
                        ResponseOrigin::RawText,
                    )
                    .with_failures(failures)
                }
            },
            Err(err) => {
                error!(
                    target: "tripcast::advisor",
                    error = %err,
                    "returning fallback plan"
                );
                AdvisorResponse::fallback(err.provider_failures().to_vec())
            }
        }
    }

    /// Classify a message into intents. Falls back to `[general]`.
    pub async fn classify_intent(&self, message: &str, language: &str) -> Vec<Intent> {
        let outcome = self
            .orchestrator
            .run(|provider| async move {
                Ok::<_, AdvisorError>(provider.classify_intent(message, language).await)
            })
            .await;

        match outcome {
            Ok(attempt) => attempt.value,
            Err(err) => {
                debug!(
                    target: "tripcast::advisor",
                    error = %err,
                    "intent classification unavailable"
                );
                vec![Intent::general()]
            }
        }
    }
}

/// Parse and coerce raw model text into a plan.
fn structure(raw: &str) -> Result<TravelRecommendation, ParseFailure> {
    let value = parser::extract(raw)?;

    let issues = shape_issues(travel_plan_schema(), &value);
    if !issues.is_empty() {
        debug!(
            target: "tripcast::advisor",
            issues = ?issues,
            "model output deviates from the plan schema; coercing leniently"
        );
    }

    TravelRecommendation::from_value(&value)
        .ok_or_else(|| ParseFailure::Malformed("no explanation or places".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_accepts_fenced_json() {
        let recommendation =
            structure("Sure! ```json\n{\"explanation\":\"ok\",\"places\":[]}\n```").unwrap();
        assert_eq!(recommendation.explanation, "ok");
        assert!(recommendation.places.is_empty());
    }

    #[test]
    fn test_structure_rejects_contentless_objects() {
        assert!(matches!(
            structure(r#"{"status": "done"}"#),
            Err(ParseFailure::Malformed(_))
        ));
        assert!(structure("just some words").is_err());
    }

    #[test]
    fn test_structure_repairs_truncated_output() {
        let recommendation =
            structure(r#"{"explanation":"Warm","places":[{"name":"Fort","description":"Old"#)
                .unwrap();
        assert_eq!(recommendation.explanation, "Warm");
        assert_eq!(recommendation.places[0].name, "Fort");
    }
}
