use serde_json::Value;

/// Close a JSON object that was cut off before its final delimiters.
///
/// The string-aware pass runs first; the counting pass is kept for inputs the
/// first pass cannot explain.
pub(super) fn repair_truncated(fragment: &str) -> Option<Value> {
    close_innermost_first(fragment).or_else(|| close_by_count(fragment))
}

fn close_innermost_first(fragment: &str) -> Option<Value> {
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for byte in fragment.bytes() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match byte {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => closers.push('}'),
            b'[' => closers.push(']'),
            b'}' | b']' => {
                if closers.last() == Some(&(byte as char)) {
                    closers.pop();
                }
            }
            _ => {}
        }
    }

    let mut patched = fragment.to_string();
    if in_string {
        if escape {
            patched.pop();
        }
        patched.push('"');
    }

    loop {
        let kept = patched.trim_end().len();
        patched.truncate(kept);
        if !patched.ends_with(',') {
            break;
        }
        patched.pop();
    }
    if patched.ends_with(':') {
        patched.push_str("null");
    }

    patched.extend(closers.iter().rev());
    serde_json::from_str(&patched).ok()
}

/// Append every missing `]` and then every missing `}`, counting raw characters.
fn close_by_count(fragment: &str) -> Option<Value> {
    let count = |needle: char| fragment.matches(needle).count();

    let mut patched = fragment.to_string();
    patched.push_str(&"]".repeat(count('[').saturating_sub(count(']'))));
    patched.push_str(&"}".repeat(count('{').saturating_sub(count('}'))));
    serde_json::from_str(&patched).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_closers_follow_opening_order() {
        let value = repair_truncated(r#"{"a":{"b":[1,{"c":[2"#).unwrap();
        assert_eq!(value, json!({"a": {"b": [1, {"c": [2]}]}}));
    }

    #[test]
    fn test_dangling_escape_is_dropped() {
        let value = repair_truncated(r#"{"a":"line\"#).unwrap();
        assert_eq!(value, json!({"a": "line"}));
    }

    #[test]
    fn test_counting_pass_closes_brackets_before_braces() {
        let value = close_by_count(r#"{"places":["a","b""#).unwrap();
        assert_eq!(value, json!({"places": ["a", "b"]}));
    }

    #[test]
    fn test_unrecoverable_fragment() {
        assert!(repair_truncated(r#"{"a":1,"b"#).is_none());
    }
}
