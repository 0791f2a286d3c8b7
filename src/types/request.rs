use serde::{Deserialize, Serialize};

use super::{
    conversation::{HistoryEntry, SessionContext},
    weather::WeatherSnapshot,
};

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Everything the boundary needs to answer one chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub message: String,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Trip length in days
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub context: SessionContext,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_duration() -> u32 {
    1
}

impl RecommendationRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            weather: None,
            language: default_language(),
            duration: default_duration(),
            context: SessionContext::default(),
        }
    }

    pub fn with_weather(mut self, weather: WeatherSnapshot) -> Self {
        if self.context.city.is_none() {
            self.context.city = weather.city().map(str::to_string);
        }
        self.weather = Some(weather);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration.max(1);
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.context.history = history;
        self
    }

    pub fn with_context(mut self, context: SessionContext) -> Self {
        self.context = context;
        self
    }

    /// Trip length, never below one day.
    pub fn trip_days(&self) -> u32 {
        self.duration.max(1)
    }
}
