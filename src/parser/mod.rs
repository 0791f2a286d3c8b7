//! Recovering parser for model output that is only probably JSON.
//!
//! Strategies run in order and the first success wins:
//! direct parse, fenced code block, balanced-brace scan, truncation repair.

mod repair;

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const PREVIEW_CHARS: usize = 300;

/// Why no structured value could be recovered from a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("response was empty")]
    Empty,

    #[error("no JSON object found in response")]
    NoObjectStart,

    #[error("balanced JSON candidate failed to parse: {0}")]
    Malformed(String),

    #[error("truncated JSON could not be repaired")]
    Unrepairable,
}

/// Extract a JSON object (or array) from raw model output.
pub fn extract(raw: &str) -> Result<Value, ParseFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::Empty);
    }

    if let Some(value) = parse_structured(trimmed) {
        return Ok(value);
    }

    if let Some(inner) = fenced_block(trimmed) {
        if let Some(value) = parse_structured(inner) {
            debug!(target: "tripcast::parser", "recovered JSON from fenced block");
            return Ok(value);
        }
    }

    let Some(start) = trimmed.find('{') else {
        warn!(
            target: "tripcast::parser",
            preview = %preview(trimmed),
            "no JSON object found in response"
        );
        return Err(ParseFailure::NoObjectStart);
    };
    let candidate = &trimmed[start..];

    match balanced_object(candidate) {
        Some(object) => serde_json::from_str(object).map_err(|err| {
            warn!(
                target: "tripcast::parser",
                error = %err,
                preview = %preview(object),
                "balanced extraction parse failed"
            );
            ParseFailure::Malformed(err.to_string())
        }),
        None => match repair::repair_truncated(candidate) {
            Some(value) => {
                debug!(target: "tripcast::parser", "repaired truncated JSON");
                Ok(value)
            }
            None => {
                warn!(
                    target: "tripcast::parser",
                    preview = %preview(trimmed),
                    "could not find balanced JSON in response"
                );
                Err(ParseFailure::Unrepairable)
            }
        },
    }
}

/// Looser extraction for short list answers such as intent classification.
///
/// Strips every fence marker, slices from the first `[` or `{` (whichever
/// comes first) to the last matching closer, and parses that span.
pub fn extract_span(raw: &str) -> Result<Value, ParseFailure> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let span = match (cleaned.find('['), cleaned.find('{')) {
        (Some(bracket), brace) if brace.map_or(true, |brace| bracket < brace) => cleaned
            .rfind(']')
            .filter(|&end| end > bracket)
            .map(|end| &cleaned[bracket..=end]),
        (_, Some(brace)) => cleaned
            .rfind('}')
            .filter(|&end| end > brace)
            .map(|end| &cleaned[brace..=end]),
        _ => None,
    };

    serde_json::from_str(span.unwrap_or(cleaned))
        .map_err(|err| ParseFailure::Malformed(err.to_string()))
}

/// First 300 characters of a response, for logs.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

fn parse_structured(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| value.is_object() || value.is_array())
}

fn fenced_block(text: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?i:json)?\s*(.*?)```").expect("fence pattern is valid")
    });

    fence
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().trim())
}

/// Slice from the opening `{` to the brace that brings depth back to zero.
///
/// Quotes toggle string mode and backslashes escape the next byte, so braces
/// inside string literals never move the depth. All delimiters are ASCII, so
/// byte offsets always land on char boundaries.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (idx, byte) in text.bytes().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        if byte == b'\\' && in_string {
            escape = true;
            continue;
        }
        if byte == b'"' {
            in_string = !in_string;
            continue;
        }
        if in_string {
            continue;
        }
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_parse_returns_value_unchanged() {
        let raw = r#"{"explanation":"Clear skies","places":[{"name":"Red Fort"}],"closing":"Enjoy"}"#;
        let expected: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(extract(raw).unwrap(), expected);
        assert_eq!(extract(&format!("\n\n  {raw}  \n")).unwrap(), expected);
    }

    #[test]
    fn test_bare_array_is_a_successful_extraction() {
        assert_eq!(extract("[1, 2, 3]").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_fenced_block_matches_unwrapped_text() {
        let body = r#"{"explanation":"ok","places":[]}"#;
        let unwrapped = extract(body).unwrap();

        for wrapped in [
            format!("```json\n{body}\n```"),
            format!("   ```\n{body}\n```\n\n"),
            format!("Here you go:\n```JSON\n  {body}  \n```\nHave fun!"),
        ] {
            assert_eq!(extract(&wrapped).unwrap(), unwrapped, "input: {wrapped}");
        }
    }

    #[test]
    fn test_balanced_scan_ignores_trailing_prose() {
        let raw = r#"Sure! {"explanation":"ok","places":[{"name":"Gate"}]} Let me know if you need more."#;
        assert_eq!(
            extract(raw).unwrap(),
            json!({"explanation": "ok", "places": [{"name": "Gate"}]})
        );
    }

    #[test]
    fn test_braces_and_escapes_inside_strings_do_not_move_depth() {
        let raw = r#"Plan: {"explanation":"Say \"hi\" to {everyone}","places":[]} -- end }"#;
        let value = extract(raw).unwrap();
        assert_eq!(value["explanation"], "Say \"hi\" to {everyone}");
        assert_eq!(value["places"], json!([]));
    }

    #[test]
    fn test_truncated_object_is_repaired_innermost_first() {
        let raw = r#"{"explanation":"Warm evening","places":[{"name":"Marine Drive","details":"Walk"},{"name":"Gateway of India""#;
        let value = extract(raw).unwrap();
        assert_eq!(value["explanation"], "Warm evening");
        let places = value["places"].as_array().unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[1]["name"], "Gateway of India");
    }

    #[test]
    fn test_truncation_inside_string_is_closed() {
        let value = extract(r#"{"explanation":"Sunny day in Par"#).unwrap();
        assert_eq!(value, json!({"explanation": "Sunny day in Par"}));
    }

    #[test]
    fn test_truncation_after_comma_or_colon() {
        let value = extract(r#"{"explanation":"ok","places":[{"name":"A"},"#).unwrap();
        assert_eq!(value["places"], json!([{"name": "A"}]));

        let value = extract(r#"{"explanation":"ok","closing":"#).unwrap();
        assert_eq!(value["closing"], Value::Null);
    }

    #[test]
    fn test_empty_and_brace_free_inputs_fail() {
        assert_eq!(extract(""), Err(ParseFailure::Empty));
        assert_eq!(extract("   \n"), Err(ParseFailure::Empty));
        assert_eq!(extract("no braces here"), Err(ParseFailure::NoObjectStart));
        assert_eq!(extract("42"), Err(ParseFailure::NoObjectStart));
    }

    #[test]
    fn test_malformed_balanced_candidate_is_not_repaired() {
        let result = extract("I like {braces} and {\"a\": 1}");
        assert!(matches!(result, Err(ParseFailure::Malformed(_))));
    }

    #[test]
    fn test_hopeless_truncation_fails() {
        assert_eq!(extract(r#"{"a": tru"#), Err(ParseFailure::Unrepairable));
    }

    #[test]
    fn test_extract_span_prefers_first_delimiter() {
        let raw = "```json\n[{\"type\":\"forecast\"},{\"type\":\"food\"}]\n```";
        assert_eq!(
            extract_span(raw).unwrap(),
            json!([{"type": "forecast"}, {"type": "food"}])
        );

        let raw = "Intent: {\"type\":\"location_change\",\"location\":\"Tokyo\"} thanks";
        assert_eq!(extract_span(raw).unwrap()["location"], "Tokyo");

        assert_eq!(extract_span("``` ```"), Err(ParseFailure::Empty));
        assert!(extract_span("nothing useful").is_err());
    }

    #[test]
    fn test_preview_is_char_safe() {
        let text = "é".repeat(400);
        assert_eq!(preview(&text).chars().count(), 300);
    }
}
