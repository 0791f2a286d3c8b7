use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub const FALLBACK_EXPLANATION: &str = "I encountered a technical issue while generating your plan. Please try again with a different city or query.";
pub const FALLBACK_CLOSING: &str = "Safe travels!";
/// Used when a model returns places without an introduction.
pub const DEFAULT_EXPLANATION: &str = "Here are some places that suit the current weather.";

/// Structured travel plan returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TravelRecommendation {
    /// Weather-aware introduction for the plan
    pub explanation: String,
    /// Recommended places in display order
    #[serde(default)]
    pub places: Vec<Place>,
    /// Optional closing remark
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing: Option<String>,
}

/// A single recommended place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Official name of the landmark, restaurant or site
    #[serde(default)]
    pub name: String,
    /// What the place is famous for
    #[serde(default)]
    pub description: String,
    /// Why the place fits the current weather
    #[serde(default)]
    pub suitability: String,
    /// What to see, activities, gear
    #[serde(default)]
    pub details: String,
    /// Short tag such as "Rainy Day Pick"
    #[serde(default, alias = "matchLabel", skip_serializing_if = "Option::is_none")]
    pub weather_match: Option<String>,
    /// 1-based day of the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_tip: Option<String>,
    /// A few English keywords for an image search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Case-insensitive parse; unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "night" => Some(Self::Night),
            _ => None,
        }
    }
}

impl TravelRecommendation {
    /// The process-wide apology plan used when every provider fails.
    pub fn fallback() -> &'static TravelRecommendation {
        static FALLBACK_PLAN: OnceLock<TravelRecommendation> = OnceLock::new();
        FALLBACK_PLAN.get_or_init(|| TravelRecommendation {
            explanation: FALLBACK_EXPLANATION.to_string(),
            places: Vec::new(),
            closing: Some(FALLBACK_CLOSING.to_string()),
        })
    }

    pub fn is_fallback(&self) -> bool {
        self == Self::fallback()
    }

    /// Wrap unstructurable model text so the user still sees the model's words.
    pub fn from_raw_text(raw: &str) -> Self {
        Self {
            explanation: raw.trim().to_string(),
            places: Vec::new(),
            closing: None,
        }
    }

    /// Coerce a parsed JSON value into a recommendation.
    ///
    /// Returns `None` when the value carries neither an explanation nor any
    /// places. Missing optional fields never cause a rejection.
    pub fn from_value(value: &Value) -> Option<Self> {
        let recommendation = match value {
            Value::Object(object) => {
                match serde_path_to_error::deserialize::<_, TravelRecommendation>(value.clone()) {
                    Ok(typed) => typed,
                    Err(err) => {
                        debug!(
                            target: "tripcast::advisor",
                            path = %err.path(),
                            error = %err.inner(),
                            "typed coercion failed, falling back to field-by-field"
                        );
                        coerce_object(object)
                    }
                }
            }
            Value::Array(items) => TravelRecommendation {
                explanation: String::new(),
                places: coerce_places(items),
                closing: None,
            },
            _ => return None,
        };

        recommendation.normalized()
    }

    fn normalized(mut self) -> Option<Self> {
        let has_explanation = !self.explanation.trim().is_empty();
        if !has_explanation && self.places.is_empty() {
            return None;
        }
        if !has_explanation {
            self.explanation = DEFAULT_EXPLANATION.to_string();
        }
        for place in &mut self.places {
            if place.day == Some(0) {
                place.day = None;
            }
        }
        self.closing = self.closing.filter(|closing| !closing.trim().is_empty());
        Some(self)
    }
}

fn coerce_object(object: &Map<String, Value>) -> TravelRecommendation {
    let places = match object.get("places") {
        Some(Value::Array(items)) => coerce_places(items),
        Some(single @ Value::Object(_)) => coerce_places(std::slice::from_ref(single)),
        _ => Vec::new(),
    };

    TravelRecommendation {
        explanation: text_field(object, "explanation").unwrap_or_default(),
        places,
        closing: text_field(object, "closing"),
    }
}

fn coerce_places(items: &[Value]) -> Vec<Place> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(coerce_place(item, object)),
            other => {
                debug!(target: "tripcast::advisor", entry = %other, "skipping non-object place");
                None
            }
        })
        .collect()
}

fn coerce_place(item: &Value, object: &Map<String, Value>) -> Place {
    if let Ok(place) = serde_path_to_error::deserialize::<_, Place>(item.clone()) {
        return place;
    }

    Place {
        name: text_field(object, "name").unwrap_or_default(),
        description: text_field(object, "description").unwrap_or_default(),
        suitability: text_field(object, "suitability").unwrap_or_default(),
        details: text_field(object, "details").unwrap_or_default(),
        weather_match: text_field(object, "weatherMatch")
            .or_else(|| text_field(object, "matchLabel")),
        day: object.get("day").and_then(day_number),
        time_of_day: object
            .get("timeOfDay")
            .and_then(Value::as_str)
            .and_then(TimeOfDay::parse),
        visit_duration: text_field(object, "visitDuration"),
        travel_tip: text_field(object, "travelTip"),
        image_search_query: text_field(object, "imageSearchQuery"),
        website: text_field(object, "website"),
        maps_url: text_field(object, "mapsUrl"),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn day_number(value: &Value) -> Option<u32> {
    let day = match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|day| day.fract() == 0.0 && *day >= 1.0)
                .map(|day| day as u64)
        })?,
        Value::String(text) => text.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(day).ok().filter(|day| *day >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_plan_is_a_stable_singleton() {
        let first = TravelRecommendation::fallback();
        let second = TravelRecommendation::fallback();
        assert!(std::ptr::eq(first, second));
        assert!(first.places.is_empty());
        assert_eq!(first.closing.as_deref(), Some(FALLBACK_CLOSING));
        assert!(first.is_fallback());
    }

    #[test]
    fn test_typed_coercion_keeps_all_fields() {
        let value = json!({
            "explanation": "Clear and warm",
            "places": [{
                "name": "Hawa Mahal",
                "description": "Palace of winds",
                "suitability": "Shaded facade",
                "details": "Go early",
                "matchLabel": "Best Fit",
                "day": 1,
                "timeOfDay": "Morning",
                "imageSearchQuery": "Hawa Mahal Jaipur",
                "mapsUrl": "https://maps.google.com/?q=Hawa+Mahal"
            }],
            "closing": "Enjoy Jaipur"
        });

        let recommendation = TravelRecommendation::from_value(&value).unwrap();
        let place = &recommendation.places[0];
        assert_eq!(place.weather_match.as_deref(), Some("Best Fit"));
        assert_eq!(place.day, Some(1));
        assert_eq!(place.time_of_day, Some(TimeOfDay::Morning));
        assert_eq!(recommendation.closing.as_deref(), Some("Enjoy Jaipur"));
    }

    #[test]
    fn test_lenient_coercion_tolerates_bad_fields() {
        let value = json!({
            "explanation": "Rainy",
            "places": [
                {"name": "Museum", "day": "2", "timeOfDay": "evening"},
                {"name": "Park", "day": 0, "timeOfDay": "brunch", "description": null},
                {"name": "Bazaar", "day": -3},
                "not a place"
            ]
        });

        let recommendation = TravelRecommendation::from_value(&value).unwrap();
        assert_eq!(recommendation.places.len(), 3);
        assert_eq!(recommendation.places[0].day, Some(2));
        assert_eq!(recommendation.places[0].time_of_day, Some(TimeOfDay::Evening));
        assert_eq!(recommendation.places[1].day, None);
        assert_eq!(recommendation.places[1].time_of_day, None);
        assert_eq!(recommendation.places[1].description, "");
        assert_eq!(recommendation.places[2].day, None);
    }

    #[test]
    fn test_missing_explanation_with_places_gets_default() {
        let recommendation =
            TravelRecommendation::from_value(&json!({"places": [{"name": "Fort"}]})).unwrap();
        assert_eq!(recommendation.explanation, DEFAULT_EXPLANATION);

        let recommendation =
            TravelRecommendation::from_value(&json!([{"name": "Lake"}, {"name": "Temple"}]))
                .unwrap();
        assert_eq!(recommendation.places.len(), 2);
    }

    #[test]
    fn test_empty_shapes_are_rejected() {
        assert!(TravelRecommendation::from_value(&json!({})).is_none());
        assert!(TravelRecommendation::from_value(&json!({"explanation": "  "})).is_none());
        assert!(TravelRecommendation::from_value(&json!([])).is_none());
        assert!(TravelRecommendation::from_value(&json!("text")).is_none());
    }

    #[test]
    fn test_serializes_in_camel_case_without_absent_fields() {
        let recommendation = TravelRecommendation {
            explanation: "ok".to_string(),
            places: vec![Place {
                name: "Gate".to_string(),
                time_of_day: Some(TimeOfDay::Night),
                ..Place::default()
            }],
            closing: None,
        };

        let value = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(value["places"][0]["timeOfDay"], "Night");
        assert!(value.get("closing").is_none());
        assert!(value["places"][0].get("mapsUrl").is_none());
    }
}
