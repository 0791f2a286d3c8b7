use std::{collections::BTreeMap, sync::OnceLock};

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::types::{CurrentConditions, ForecastEntry, WeatherSnapshot};

const UNKNOWN: &str = "N/A";

/// System prompt asking for a weather-aware plan as a raw JSON object.
pub(crate) fn weather_system_prompt(
    weather: &WeatherSnapshot,
    language: &str,
    duration: u32,
    message: &str,
) -> String {
    let current = weather.current.as_ref();
    let city = weather.city().unwrap_or("the city");
    let (visibility_km, visibility) = visibility_level(current.and_then(|c| c.visibility));
    let offset = current.and_then(|c| c.timezone);
    let sunrise = format_time(current.and_then(|c| c.sunrise), offset);
    let sunset = format_time(current.and_then(|c| c.sunset), offset);
    let forecast = forecast_summary(weather, duration);
    let guidance = category_guidance(message, city, duration);
    let itinerary_fields = if duration > 1 {
        "\n      \"day\": 1,\n      \"timeOfDay\": \"Morning | Afternoon | Evening | Night\","
    } else {
        ""
    };

    format!(
        r#"
You are an expert travel planner for weather-aware itineraries, outings, dining and clothing advice.
Every suggestion MUST be justified by the weather below. Do not answer shopping or fashion questions unrelated to the weather.

TRIP DURATION: {duration} day(s)
CURRENT CITY: {city}

WEATHER:
- Temperature: {temp}°C (feels like {feels_like}°C)
- Conditions: {conditions}
- Visibility: {visibility_km}km ({visibility})
- Humidity: {humidity}%
- Wind speed: {wind} m/s
- Cloud cover: {clouds}%
- Sunrise: {sunrise} | Sunset: {sunset}
- Pressure: {pressure} hPa
{forecast}
GOAL: Recommend between 4 and 6 places in {city} that the city is genuinely famous for, chosen for these conditions.
- One day: a compact day trip with places that are close together or logically connected.
- Several days: spread the places over the days (Day 1: ..., Day 2: ...).
{guidance}

Prefer real landmarks, heritage sites, museums, markets, local cuisine, religious sites, parks and lakes. Never invent generic places.

WEATHER RULES:
- Visibility under 2km or fog: indoor attractions, museums, monuments with interiors.
- Plan outdoor activities around sunrise and before sunset ({sunset}).
- Humidity above 70% with heat: water activities, air-conditioned venues, light clothing.
- Below 10°C: warm indoor spots and winter wear.
- Clear skies and good visibility: viewpoints, parks, natural landmarks.
- Rain: covered markets, indoor attractions, rain gear.

CITY RULES:
- Always plan for {city}. If the user mentions another place as personal background (e.g. "I am from Tokyo"), acknowledge it in the explanation and adapt the advice for {city}.
- Only when the user explicitly asks for weather, a plan or places FOR a different city, reply in {language} with exactly: "Please change the city from bottom menu to fetch weather details" and nothing else.

OUTPUT: return ONLY a raw JSON object. No markdown, no backticks, no preamble.
{{
  "explanation": "4-5 sentences in {language} about what {city} is famous for and how today's visibility, temperature or humidity affect a visit.",
  "places": [
    {{{itinerary_fields}
      "name": "Real name of a famous place in {city}, in {language}",
      "description": "Why the place is significant, in {language}",
      "suitability": "Why it fits the current weather, in {language}",
      "weatherMatch": "2-3 word tag such as 'Rainy Day Pick', in {language}",
      "details": "History, what to see, best time to visit, in {language}",
      "visitDuration": "Suggested time on site",
      "travelTip": "One practical tip",
      "imageSearchQuery": "3-4 English keywords for an image search",
      "website": "Official website URL",
      "mapsUrl": "Google Maps URL"
    }}
  ],
  "closing": "One friendly closing sentence in {language}."
}}

USER MESSAGE: "{message}"
Response:"#,
        temp = reading(current, |c| c.temp),
        feels_like = reading(current, |c| c.feels_like),
        conditions = current.map_or(UNKNOWN, |c| c.description.as_str()),
        humidity = reading(current, |c| c.humidity),
        wind = reading(current, |c| c.wind_speed),
        clouds = reading(current, |c| c.clouds),
        pressure = reading(current, |c| c.pressure),
    )
}

fn reading(current: Option<&CurrentConditions>, field: impl Fn(&CurrentConditions) -> f64) -> String {
    current.map_or_else(|| UNKNOWN.to_string(), |c| field(c).to_string())
}

/// Visibility in km (one decimal) and its qualitative level.
pub(crate) fn visibility_level(metres: Option<f64>) -> (String, &'static str) {
    match metres.filter(|m| *m > 0.0) {
        Some(m) => {
            let level = if m >= 10_000.0 {
                "Excellent"
            } else if m >= 5_000.0 {
                "Good"
            } else if m >= 2_000.0 {
                "Moderate"
            } else {
                "Poor"
            };
            (format!("{:.1}", m / 1000.0), level)
        }
        None => (UNKNOWN.to_string(), "Unknown"),
    }
}

/// 24-hour `HH:MM` in the city's offset (UTC when unknown).
pub(crate) fn format_time(timestamp: Option<i64>, offset_seconds: Option<i32>) -> String {
    let Some(timestamp) = timestamp.filter(|ts| *ts != 0) else {
        return UNKNOWN.to_string();
    };
    let offset = offset_seconds
        .and_then(FixedOffset::east_opt)
        .or_else(|| FixedOffset::east_opt(0));

    match (DateTime::from_timestamp(timestamp, 0), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%H:%M").to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Up to three readings per day (midday, evening, night) for the first `duration` days.
pub(crate) fn forecast_summary(weather: &WeatherSnapshot, duration: u32) -> String {
    if duration == 0 || weather.forecast.is_empty() {
        return String::new();
    }

    let mut days: BTreeMap<&str, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in &weather.forecast {
        days.entry(entry.date()).or_default().push(entry);
    }

    let lines: Vec<String> = days
        .iter()
        .take(duration as usize)
        .map(|(date, items)| {
            let near = |target: u32| {
                items
                    .iter()
                    .copied()
                    .find(|item| item.hour().is_some_and(|hour| hour.abs_diff(target) <= 1))
            };
            let day = near(12).or_else(|| items.get(items.len() / 2).copied());
            let evening = near(18);
            let night = near(21).or_else(|| items.last().copied());

            let mut seen: Vec<&str> = Vec::new();
            let details = [("Day", day), ("Evening", evening), ("Night", night)]
                .into_iter()
                .filter_map(|(label, item)| Some((label, item?)))
                .filter(|(_, item)| {
                    if seen.contains(&item.time.as_str()) {
                        false
                    } else {
                        seen.push(item.time.as_str());
                        true
                    }
                })
                .map(|(label, item)| {
                    format!("{}: {}°C ({})", label, item.temp.round(), item.description)
                })
                .collect::<Vec<_>>()
                .join(" | ");

            format!("- {}: {}", date, details)
        })
        .collect();

    format!(
        "\nFORECAST (3 KEY POINTS PER DAY FOR {} DAYS):\n{}\n",
        duration,
        lines.join("\n")
    )
}

fn category_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                r"(?i)\b(food|restaurant|dining|eat|cuisine|dish|meal|cafe|street food)\b",
                "food/dining establishments",
            ),
            (
                r"(?i)\b(cloth|fashion|apparel|wear|boutique|textile|garment|shop|market|mall|retail)\b",
                "clothing/apparel stores",
            ),
            (
                r"(?i)\b(agri|farm|garden|crop|organic|nursery|plantation)\b",
                "agricultural/nature sites",
            ),
        ]
        .into_iter()
        .map(|(pattern, label)| (Regex::new(pattern).expect("category pattern is valid"), label))
        .collect()
    })
}

/// Extra instructions when the message names a food, clothing or agriculture theme.
pub(crate) fn category_guidance(message: &str, city: &str, duration: u32) -> String {
    let categories: Vec<&str> = category_patterns()
        .iter()
        .filter(|(pattern, _)| pattern.is_match(message))
        .map(|(_, label)| *label)
        .collect();

    if categories.is_empty() {
        return format!(
            "\nGENERAL RECOMMENDATIONS:\nRecommend 5-6 famous places (landmarks, monuments, natural sites, buildings) that {city} is uniquely known for, as a feasible {duration}-day plan."
        );
    }

    let focus = categories.join(" OR ");
    format!(
        "\nCATEGORY FOCUS: the user asked about {focus}.\nRecommend 5-6 places in {city} that are famous for {focus}, paced for a {duration}-day trip.\n- Clothing: gear that suits the forecast (winter wear, rain gear).\n- Food: dishes that suit the conditions (hot drinks in the cold, light meals in the heat).\n- Only real, well-known places in {city}."
    )
}
