use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    LocationChange,
    WeatherQuery,
    GeneralQuery,
    Outing,
    Food,
    Forecast,
    General,
}

/// A weather-related intent detected in a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub kind: IntentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Intent {
    pub fn general() -> Self {
        Self {
            kind: IntentType::General,
            location: None,
        }
    }

    /// Read intents from a parsed model answer. A lone object counts as a one-element list.
    pub fn list_from_value(value: Value) -> Result<Vec<Intent>, serde_json::Error> {
        match value {
            Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
            other => serde_json::from_value(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reads_intent_list() {
        let intents = Intent::list_from_value(json!([
            {"type": "location_change", "location": "Tokyo"},
            {"type": "forecast"}
        ]))
        .unwrap();

        assert_eq!(intents[0].kind, IntentType::LocationChange);
        assert_eq!(intents[0].location.as_deref(), Some("Tokyo"));
        assert_eq!(intents[1], Intent { kind: IntentType::Forecast, location: None });
    }

    #[test]
    fn test_single_object_and_unknown_type() {
        let intents = Intent::list_from_value(json!({"type": "food"})).unwrap();
        assert_eq!(intents.len(), 1);
        assert!(Intent::list_from_value(json!([{"type": "dance"}])).is_err());
    }
}
