// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of host log records into self-contained JSON documents.
//!
//! Every document carries the record's own fields plus a reserved
//! `@timestamp` field holding the event time as RFC 3339 text:
//!
//! ```text
//! {"@timestamp":"2024-01-15T10:30:00.123456789Z","level":"info","message":"hello"}
//! ```

use chrono::{DateTime, Timelike, Utc};
use serde_json::{Map, Number, Value};

use crate::errors::EncodingError;

/// Name of the field injected into every serialized record.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// A single value of a host record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Raw bytes, emitted as text without escaping or base64.
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
    Map(Vec<(String, FieldValue)>),
}

/// A host record: field names paired with values, in arrival order.
///
/// Duplicate keys are allowed; the last occurrence wins in the document.
pub type Record = Vec<(String, FieldValue)>;

impl FieldValue {
    fn to_json(&self, field: &str) -> Result<Value, EncodingError> {
        let value = match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number(Number::from(*i)),
            FieldValue::UInt(u) => Value::Number(Number::from(*u)),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                EncodingError::UnrepresentableValue {
                    field: field.to_string(),
                }
            })?,
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            FieldValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.to_json(field))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            FieldValue::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json(key)?);
                }
                Value::Object(map)
            }
        };
        Ok(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Renders a timestamp as RFC 3339 text in UTC with up to nine fractional
/// digits. Trailing zeros of the fraction are dropped, so whole seconds have
/// no fractional part at all.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let mut out = timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
    // chrono encodes leap seconds as nanos >= 1e9
    let nanos = timestamp.nanosecond() % 1_000_000_000;
    if nanos > 0 {
        let digits = format!("{nanos:09}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

/// Serializes one record into a JSON document.
///
/// The tag is routing metadata only and never becomes a document field. If the
/// record defines its own `@timestamp`, the injected value replaces it.
///
/// # Errors
///
/// Returns [`EncodingError`] when a value has no JSON representation, such as
/// a NaN or infinite float. The caller drops that record and carries on.
pub fn serialize_record(
    timestamp: &DateTime<Utc>,
    _tag: &str,
    record: &[(String, FieldValue)],
) -> Result<String, EncodingError> {
    let mut document = Map::with_capacity(record.len() + 1);
    for (key, value) in record {
        document.insert(key.clone(), value.to_json(key)?);
    }
    document.insert(
        TIMESTAMP_FIELD.to_string(),
        Value::String(format_timestamp(timestamp)),
    );

    serde_json::to_string(&Value::Object(document)).map_err(|e| EncodingError::Json(e.to_string()))
}
