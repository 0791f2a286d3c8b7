//! Text-generation backends and the capabilities shared by all of them.

mod gemini;
mod http;
mod huggingface;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    config::{ProviderKind, Settings},
    error::{AdvisorError, Result},
    parser,
    prompts::{build_messages, PromptComposer},
    types::{ChatMessage, Intent, SessionContext, WeatherSnapshot},
};

pub use gemini::GeminiProvider;
pub use huggingface::{ChatCompletionRequest, HuggingFaceProvider};

/// A backend that turns chat messages into text.
///
/// Only [`Provider::complete`] talks to the network. The higher-level
/// capabilities are built on top of it and may be overridden.
#[async_trait]
pub trait Provider: Send + Sync + fmt::Debug {
    /// Human-readable identity, e.g. `Gemini (gemini-2.5-flash)`.
    fn identity(&self) -> &str;

    fn composer(&self) -> &dyn PromptComposer;

    /// One round trip to the backend. Blank replies are errors.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Classify the message into intents. Never fails; `[general]` is the floor.
    async fn classify_intent(&self, message: &str, language: &str) -> Vec<Intent> {
        let prompt = self.composer().intent_prompt(message, language);
        let messages = [ChatMessage::system(prompt), ChatMessage::user(message)];

        let classified = match self.complete(&messages).await {
            Ok(text) => parser::extract_span(&text)
                .map_err(AdvisorError::from)
                .and_then(|value| Intent::list_from_value(value).map_err(AdvisorError::from)),
            Err(err) => Err(err),
        };

        match classified {
            Ok(intents) if !intents.is_empty() => intents,
            Ok(_) => vec![Intent::general()],
            Err(err) => {
                debug!(
                    target: "tripcast::providers",
                    provider = self.identity(),
                    error = %err,
                    "intent classification degraded to general"
                );
                vec![Intent::general()]
            }
        }
    }

    /// Ask for a weather-aware plan and return the raw reply text.
    async fn generate_weather_recommendation(
        &self,
        message: &str,
        weather: &WeatherSnapshot,
        language: &str,
        context: &SessionContext,
        duration: u32,
    ) -> Result<String> {
        let system_prompt = self
            .composer()
            .weather_prompt(weather, language, duration, message);
        let messages = build_messages(system_prompt, &context.history, message);
        let reply = self.complete(&messages).await?;
        Ok(reply.trim().to_string())
    }

    /// Reply used before a destination is known. Makes no network call.
    async fn generate_chat_reply(
        &self,
        _message: &str,
        language: &str,
        _context: &SessionContext,
    ) -> Result<String> {
        Ok(self.composer().chat_placeholder(language))
    }
}

/// Build one provider, or `None` when it cannot be configured.
pub fn build_provider(kind: ProviderKind, settings: &Settings) -> Option<Arc<dyn Provider>> {
    let provider_settings = settings.provider(kind);
    let built: Result<Arc<dyn Provider>> = match kind {
        ProviderKind::HuggingFace => HuggingFaceProvider::new(provider_settings)
            .map(|provider| Arc::new(provider) as Arc<dyn Provider>),
        ProviderKind::Gemini => GeminiProvider::new(provider_settings)
            .map(|provider| Arc::new(provider) as Arc<dyn Provider>),
    };

    match built {
        Ok(provider) => {
            info!(
                target: "tripcast::providers",
                provider = provider.identity(),
                "provider enabled"
            );
            Some(provider)
        }
        Err(err) => {
            warn!(
                target: "tripcast::providers",
                kind = %kind,
                error = %err,
                "provider disabled"
            );
            None
        }
    }
}

/// All configured providers in preference order, skipping duplicates.
pub fn build_active_providers(settings: &Settings) -> Vec<Arc<dyn Provider>> {
    let mut seen: Vec<ProviderKind> = Vec::new();
    settings
        .provider_order
        .iter()
        .copied()
        .filter(|kind| {
            if seen.contains(kind) {
                false
            } else {
                seen.push(*kind);
                true
            }
        })
        .filter_map(|kind| build_provider(kind, settings))
        .collect()
}
