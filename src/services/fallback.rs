use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    error::{AdvisorError, ProviderFailure, Result},
    providers::Provider,
};

/// A successful attempt plus what went wrong before it.
#[derive(Debug)]
pub struct Attempt<T> {
    pub value: T,
    /// Identity of the provider that answered
    pub provider: String,
    /// Providers tried earlier in the same request, in order
    pub failures: Vec<ProviderFailure>,
}

/// Runs one operation against an ordered provider list until one succeeds.
///
/// Attempts are strictly sequential. The first provider is the primary and
/// is always tried first; each later provider is tried only after every
/// earlier one failed.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn Provider>>,
    attempt_timeout: Option<Duration>,
}

impl FallbackOrchestrator {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            attempt_timeout: None,
        }
    }

    /// Bound each provider attempt. An expired attempt counts as a failure.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Option<Duration>) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Try `operation` on each provider in order.
    ///
    /// Returns the first success, or [`AdvisorError::AllProvidersFailed`]
    /// carrying one entry per provider in attempt order.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<Attempt<T>>
    where
        F: Fn(Arc<dyn Provider>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = Vec::with_capacity(self.providers.len());

        for (index, provider) in self.providers.iter().enumerate() {
            let identity = provider.identity().to_string();
            let attempt = operation(Arc::clone(provider));

            let outcome = match self.attempt_timeout {
                Some(limit) => match timeout(limit, attempt).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AdvisorError::Timeout(format!(
                        "no answer within {}s",
                        limit.as_secs_f32()
                    ))),
                },
                None => attempt.await,
            };

            match outcome {
                Ok(value) => {
                    if index > 0 {
                        info!(
                            target: "tripcast::fallback",
                            provider = %identity,
                            attempt = index + 1,
                            "fallback provider answered"
                        );
                    }
                    return Ok(Attempt {
                        value,
                        provider: identity,
                        failures,
                    });
                }
                Err(err) => {
                    warn!(
                        target: "tripcast::fallback",
                        provider = %identity,
                        error_code = err.error_code(),
                        error = %err,
                        "provider failed"
                    );
                    failures.push(ProviderFailure::new(identity, err.to_string()));
                }
            }
        }

        Err(AdvisorError::AllProvidersFailed(failures))
    }
}
