//! Generation Response Parsing
//!
//! Turns a free-text reply into a JSON object:
//! 1. Isolate the payload (code fences)
//! 2. Parse strictly
//! 3. Optionally repair malformed JSON
//!
//! Anything that does not end up as a JSON object is a failure; callers
//! decide which domain error it becomes.

mod json_repair;

pub use json_repair::{JsonRepairer, extract_json_block};

use serde_json::{Map, Value};

/// Reply parsed into a JSON object
#[derive(Debug, Clone)]
pub struct ParsedObject {
    pub object: Map<String, Value>,
    /// Whether repair was needed to get here
    pub was_repaired: bool,
}

/// Parses generation replies into JSON objects
#[derive(Default)]
pub struct ResponseParser {
    repairer: Option<JsonRepairer>,
}

impl ResponseParser {
    /// Strict parser, no repair
    pub fn strict() -> Self {
        Self { repairer: None }
    }

    pub fn with_repair(repair: bool) -> Self {
        Self {
            repairer: repair.then(JsonRepairer::new),
        }
    }

    /// Parse `raw` into a JSON object; the error is a human-readable reason
    pub fn parse_object(&self, raw: &str) -> std::result::Result<ParsedObject, String> {
        let block = extract_json_block(raw);

        let strict_error = match serde_json::from_str::<Value>(block) {
            Ok(value) => return into_object(value, false),
            Err(e) => e.to_string(),
        };

        match self.repairer.as_ref().and_then(|r| r.parse_or_repair(block)) {
            Some((value, was_repaired)) => into_object(value, was_repaired),
            None => Err(strict_error),
        }
    }
}

fn into_object(value: Value, was_repaired: bool) -> std::result::Result<ParsedObject, String> {
    match value {
        Value::Object(object) => Ok(ParsedObject {
            object,
            was_repaired,
        }),
        other => Err(format!("expected a JSON object, found {}", kind(&other))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
