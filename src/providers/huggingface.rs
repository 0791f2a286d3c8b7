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
    types::ChatMessage,
};

const TOP_P: f32 = 0.9;

/// OpenAI-compatible chat completions served by the Hugging Face router.
pub struct HuggingFaceProvider {
    client: Client,
    api_key: String,
    settings: ProviderSettings,
    identity: String,
    composer: Arc<dyn PromptComposer>,
}

impl HuggingFaceProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let api_key = settings
            .api_key()
            .ok_or_else(|| AdvisorError::Config("HuggingFace API key is required".to_string()))?
            .to_string();

        let client = Client::builder().timeout(settings.request_timeout).build()?;

        Ok(Self {
            client,
            api_key,
            identity: format!("HuggingFace ({})", settings.model),
            settings: settings.clone(),
            composer: Arc::new(DefaultPromptComposer),
        })
    }

    pub fn with_composer(mut self, composer: Arc<dyn PromptComposer>) -> Self {
        self.composer = composer;
        self
    }
}

impl fmt::Debug for HuggingFaceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceProvider")
            .field("identity", &self.identity)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn composer(&self) -> &dyn PromptComposer {
        self.composer.as_ref()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;

        let body = ChatCompletionRequest::new(&self.settings.model, messages)
            .with_max_tokens(Some(self.settings.max_tokens))
            .with_temperature(Some(self.settings.temperature))
            .with_top_p(Some(TOP_P))
            .into_value();

        let url = build_chat_url(&self.settings.base_url);
        debug!(target: "tripcast::providers", provider = %self.identity, url = %url, "sending chat completion");

        let request = self.client.post(url).bearer_auth(&self.api_key);
        let response = post_json(&self.identity, request, &body).await?;

        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(AdvisorError::EmptyCompletion(self.identity.clone()));
        }
        Ok(content.to_string())
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

/// Body of an OpenAI-style `/chat/completions` call.
#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
            "stream": false,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(top_p);
        }

        body
    }
}
