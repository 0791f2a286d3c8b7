//! Instruction text sent to providers.

mod weather;

use std::fmt;

use serde_json::json;

use crate::types::{ChatMessage, HistoryEntry, Role, WeatherSnapshot};

/// User turn sent when the caller's message is blank.
pub const DEFAULT_USER_MESSAGE: &str = "Give me travel plans";

/// Builds the prompts a provider sends. Providers treat the output as opaque text.
pub trait PromptComposer: Send + Sync + fmt::Debug {
    /// System prompt for a weather-aware travel plan.
    fn weather_prompt(
        &self,
        weather: &WeatherSnapshot,
        language: &str,
        duration: u32,
        message: &str,
    ) -> String;

    /// Prompt asking for a JSON array of intents.
    fn intent_prompt(&self, message: &str, language: &str) -> String {
        intent_prompt(message, language)
    }

    /// Reply used when there is no weather snapshot to reason about yet.
    fn chat_placeholder(&self, language: &str) -> String {
        chat_placeholder(language)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPromptComposer;

impl PromptComposer for DefaultPromptComposer {
    fn weather_prompt(
        &self,
        weather: &WeatherSnapshot,
        language: &str,
        duration: u32,
        message: &str,
    ) -> String {
        weather::weather_system_prompt(weather, language, duration, message)
    }
}

/// System prompt, then prior turns, then the current user message.
pub fn build_messages(
    system_prompt: String,
    history: &[HistoryEntry],
    user_message: &str,
) -> Vec<ChatMessage> {
    let user_message = if user_message.trim().is_empty() {
        DEFAULT_USER_MESSAGE
    } else {
        user_message
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|entry| entry.role != Role::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(user_message));
    messages
}

pub fn intent_prompt(message: &str, language: &str) -> String {
    format!(
        r#"Analyze the user message for weather-related intents.
Possible intents, as a JSON array:
- {{"type": "location_change", "location": "City Name"}} (ONLY when the user explicitly wants information FOR that city, not when it is personal context such as "I am from India")
- {{"type": "outing"}} (planning/itinerary)
- {{"type": "food"}} (restaurants/dining)
- {{"type": "forecast"}} (hourly/daily)
- {{"type": "general"}} (advice such as umbrella/clothing)

Message: "{message}"
Language: {language}
Return ONLY the JSON array of intents, e.g.
[{{"type":"location_change", "location": "Tokyo"}}, {{"type":"forecast"}}]"#
    )
}

/// Localized prompt-for-destination, encoded as a recommendation JSON object.
pub fn chat_placeholder(language: &str) -> String {
    let explanation = match language {
        "ja-JP" => "目的地を選択して、旅行プランを始めましょう。",
        "hi-IN" => "अपनी यात्रा की योजना शुरू करने के लिए कृपया एक गंतव्य चुनें।",
        _ => "Please select a destination to start planning your trip.",
    };
    json!({ "explanation": explanation, "places": [] }).to_string()
}
