//! tripcast: weather-aware travel recommendations from interchangeable LLM backends
//!
//! Requests go through an ordered chain of providers; the first one that answers
//! wins. Free-form model output is recovered into a structured plan, and when every
//! provider fails the caller still gets a well-formed fallback plan.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tripcast::{RecommendationRequest, Settings, TravelAdvisor, WeatherSnapshot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let advisor = TravelAdvisor::from_settings(&settings);
//!
//!     let weather: WeatherSnapshot = serde_json::from_str(r#"{"current": {"city": "Jaipur", "temp": 31}}"#)?;
//!     let request = RecommendationRequest::new("Plan a cool evening").with_weather(weather);
//!
//!     let response = advisor.generate_recommendation(&request).await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod schemas;
pub mod services;
pub mod types;

pub use config::{ParseFailurePolicy, ProviderKind, ProviderSettings, Settings};
pub use error::{AdvisorError, ProviderFailure, Result};
pub use parser::ParseFailure;
pub use prompts::{DefaultPromptComposer, PromptComposer};
pub use providers::{GeminiProvider, HuggingFaceProvider, Provider};
pub use schemas::SchemaHandle;
pub use services::{Attempt, FallbackOrchestrator, TravelAdvisor};
pub use types::{
    AdvisorResponse, ChatMessage, HistoryEntry, Intent, IntentType, Place, RecommendationRequest,
    ResponseOrigin, Role, SessionContext, TimeOfDay, TravelRecommendation, WeatherSnapshot,
};

#[cfg(feature = "cli")]
pub mod cli;
