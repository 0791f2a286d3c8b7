use reqwest::{header::RETRY_AFTER, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::{
    error::{AdvisorError, Result},
    parser::preview,
};

/// Send a JSON body and return the decoded JSON reply.
///
/// A single attempt: rate limits, non-2xx statuses and error payloads become
/// errors so the orchestrator can move on to the next provider.
pub(crate) async fn post_json(provider: &str, request: RequestBuilder, body: &Value) -> Result<Value> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    let headers = response.headers().clone();
    let response_text = response.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(1)
            .max(1);
        return Err(AdvisorError::RateLimit { retry_after });
    }

    let response_json: Value = match serde_json::from_str(&response_text) {
        Ok(json) => json,
        Err(err) if status.is_success() => return Err(err.into()),
        Err(_) => Value::Null,
    };

    if !status.is_success() {
        let message = api_error_message(&response_json).unwrap_or_else(|| preview(&response_text));
        return Err(AdvisorError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    if response_json.get("error").is_some() {
        let message = api_error_message(&response_json).unwrap_or_default();
        return Err(AdvisorError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(response_json)
}

fn api_error_message(response_json: &Value) -> Option<String> {
    let error = response_json.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}
