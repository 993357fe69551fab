//! Field-level JSON codec for values the service only stores as strings.
//!
//! # Design
//! The service keeps every field as a scalar, so structured values travel as
//! JSON text inside a string. Which fields get that treatment is decided by
//! an [`EncodingPolicy`], fixed per client:
//!
//! - `Fields`: only the named fields are encoded, whatever their value.
//! - `Containers`: any array or object is encoded, whatever its field name.
//!
//! Decoding never fails. A string that does not parse is ordinary data and
//! is returned untouched; parse failure, not the shape of the string, is
//! what tells the two apart. Under `Containers`, a string that parses to a
//! scalar (`"1"`, `"true"`, `"null"`) also stays a string, since only arrays
//! and objects are ever encoded on the way out.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::types::Record;

/// Which fields travel as JSON-encoded strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// Encode exactly these field names.
    Fields(BTreeSet<String>),
    /// Encode every array or object value.
    Containers,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        EncodingPolicy::Containers
    }
}

impl EncodingPolicy {
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EncodingPolicy::Fields(names.into_iter().map(Into::into).collect())
    }

    fn encodes(&self, name: &str, value: &Value) -> bool {
        match self {
            EncodingPolicy::Fields(names) => names.contains(name),
            EncodingPolicy::Containers => is_container(value),
        }
    }
}

/// Wire form of a single field value.
pub fn encode_value(name: &str, value: &Value, policy: &EncodingPolicy) -> Value {
    if policy.encodes(name, value) {
        Value::String(value.to_string())
    } else {
        value.clone()
    }
}

/// Convert a record into its wire form.
pub fn encode_record(record: &Record, policy: &EncodingPolicy) -> Record {
    record
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(name, value, policy)))
        .collect()
}

/// Convert a wire record back into structured values.
pub fn decode_record(record: Record, policy: &EncodingPolicy) -> Record {
    record
        .into_iter()
        .map(|(name, value)| {
            let decoded = decode_field(&name, value, policy);
            (name, decoded)
        })
        .collect()
}

fn decode_field(name: &str, value: Value, policy: &EncodingPolicy) -> Value {
    let Value::String(raw) = value else {
        return value;
    };
    match policy {
        EncodingPolicy::Fields(names) if names.contains(name) => decode_or_keep(raw, |_| true),
        EncodingPolicy::Fields(_) => Value::String(raw),
        // Only containers were encoded on the way out, so a string that
        // parses to a scalar ("1", "true") is left as the caller wrote it.
        EncodingPolicy::Containers => decode_or_keep(raw, is_container),
    }
}

fn parse_json(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parse `raw` as JSON, falling back to the string itself when parsing fails
/// or `accept` rejects the result.
fn decode_or_keep(raw: String, accept: impl Fn(&Value) -> bool) -> Value {
    parse_json(&raw)
        .ok()
        .filter(|v| accept(v))
        .unwrap_or(Value::String(raw))
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}
