//! JSON schema for the recommendation contract, derived from the Rust types.
//!
//! Parsed model output is checked against it for diagnostics only; coercion
//! stays lenient.

use std::sync::{Arc, OnceLock};

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::types::TravelRecommendation;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Cached JSON schema for a response type.
#[derive(Clone, Debug)]
pub struct SchemaHandle {
    schema_name: &'static str,
    schema_json: Arc<Value>,
}

impl SchemaHandle {
    pub fn new(schema_name: &'static str, schema_json: Value) -> Self {
        Self {
            schema_name,
            schema_json: Arc::new(schema_json),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }
}

/// Schema for [`TravelRecommendation`], built once.
pub fn travel_plan_schema() -> &'static SchemaHandle {
    static HANDLE: OnceLock<SchemaHandle> = OnceLock::new();
    HANDLE.get_or_init(|| {
        let root = schemars::schema_for!(TravelRecommendation);
        let schema_json = serde_json::to_value(root).unwrap_or_else(|err| {
            panic!("failed to serialize schema for TravelRecommendation: {err}")
        });
        SchemaHandle::new("TravelRecommendation", schema_json)
    })
}

/// Describe how `payload` deviates from `schema`, at most three entries.
///
/// An empty list means the payload conforms.
pub fn shape_issues(schema: &SchemaHandle, payload: &Value) -> Vec<String> {
    let validator = match JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
    {
        Ok(validator) => validator,
        Err(err) => {
            return vec![format!(
                "failed to prepare `{}` schema for validation: {}",
                schema.schema_name(),
                err
            )]
        }
    };

    let mut details = Vec::new();
    if let Err(errors) = validator.validate(payload) {
        for (idx, error) in errors.enumerate() {
            if idx == MAX_SCHEMA_ERRORS {
                details.push("additional errors truncated".to_string());
                break;
            }
            let mut path = error.instance_path.to_string();
            if path.is_empty() {
                path = "<root>".to_string();
            }
            details.push(format!("{}: {}", path, error));
        }
    }
    details
}
