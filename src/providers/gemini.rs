use std::{fmt, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{http::post_json, Provider};
use crate::{
    config::ProviderSettings,
    error::{AdvisorError, Result},
    prompts::{DefaultPromptComposer, PromptComposer},
    types::{ChatMessage, Role},
};

/// Google Gemini through the `generateContent` REST endpoint.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    settings: ProviderSettings,
    identity: String,
    composer: Arc<dyn PromptComposer>,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .api_key()
            .ok_or_else(|| AdvisorError::Config("Gemini API key is required".to_string()))?
            .to_string();

        let client = Client::builder().timeout(settings.request_timeout).build()?;

        Ok(Self {
            client,
            api_key,
            identity: format!("Gemini ({})", settings.model),
            settings: settings.clone(),
            composer: Arc::new(DefaultPromptComposer),
        })
    }

    pub fn with_composer(mut self, composer: Arc<dyn PromptComposer>) -> Self {
        self.composer = composer;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request_body(&self, messages: &[ChatMessage]) -> Value {
        let system_text = messages
            .iter()
            .filter(|message| message.role == Role::System)
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents: Vec<Value> = messages
            .iter()
            .filter(|message| message.role != Role::System)
            .map(|message| {
                let role = match message.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": message.content }] })
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.settings.temperature,
                "maxOutputTokens": self.settings.max_tokens,
            },
        });

        if !system_text.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_text }] });
        }
        body
    }
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("identity", &self.identity)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn composer(&self) -> &dyn PromptComposer {
        self.composer.as_ref()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = self.request_body(messages);
        let url = self.endpoint();
        debug!(target: "tripcast::providers", provider = %self.identity, url = %url, "sending generateContent");

        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key);
        let response = post_json(&self.identity, request, &body).await?;

        if let Some(reason) = response
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
        {
            return Err(AdvisorError::EmptyCompletion(format!(
                "{} (blocked: {})",
                self.identity, reason
            )));
        }

        let text = candidate_text(&response);
        if text.trim().is_empty() {
            return Err(AdvisorError::EmptyCompletion(self.identity.clone()));
        }
        Ok(text.trim().to_string())
    }
}

/// Concatenated text parts of the first candidate.
fn candidate_text(response: &Value) -> String {
    response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
