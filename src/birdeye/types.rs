//! Birdeye response types and record normalization
//!
//! Endpoints return records in one of two envelopes:
//! `{"data": {"items": [...]}}` or `{"data": [...]}`. Both decode to the same
//! flat record list.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::{FetchError, FetchResult};

/// One row of market data: field name to untyped scalar, in API order
pub type Record = Map<String, Value>;

/// Top-level response body
#[derive(Debug, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub data: Option<ResponseData>,
}

/// Payload under `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Items { items: Vec<Value> },
    List(Vec<Value>),
    Other(Value),
}

impl ResponseEnvelope {
    /// Records carried by the envelope, or the reason there are none
    pub fn into_records(self) -> FetchResult<Vec<Record>> {
        if self.success == Some(false) {
            let message = match self.message {
                Some(Value::String(text)) => text,
                Some(Value::Null) | None => "Unknown error".to_string(),
                Some(other) => other.to_string(),
            };
            return Err(FetchError::Api { message });
        }

        match self.data {
            Some(ResponseData::Items { items }) | Some(ResponseData::List(items)) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| item_to_record(idx, item))
                .collect(),
            Some(ResponseData::Other(value)) => Err(FetchError::UnrecognizedShape(format!(
                "'data' is {}, expected an object with 'items' or a list",
                json_kind(&value)
            ))),
            None => Err(FetchError::UnrecognizedShape(
                "no 'data' field in response".to_string(),
            )),
        }
    }
}

/// Decode a raw response body into records
pub fn decode_response(body: &str) -> FetchResult<Vec<Record>> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if !value.is_object() {
        return Err(FetchError::UnrecognizedShape(format!(
            "top level is {}, expected an object",
            json_kind(&value)
        )));
    }

    let envelope = ResponseEnvelope::deserialize(value)
        .map_err(|e| FetchError::UnrecognizedShape(e.to_string()))?;
    envelope.into_records()
}

/// Objects pass through; positional rows get keys "0", "1", ...
fn item_to_record(idx: usize, item: Value) -> FetchResult<Record> {
    match item {
        Value::Object(map) => Ok(map),
        Value::Array(values) => Ok(values
            .into_iter()
            .enumerate()
            .map(|(col, v)| (col.to_string(), v))
            .collect()),
        other => Err(FetchError::UnrecognizedShape(format!(
            "item {} is {}, expected an object or a list",
            idx,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
