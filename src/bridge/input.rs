// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Input value normalization
//!
//! Callers hand the bridge named input buffers as text, raw bytes, or a
//! dynamically typed value (typically deserialized from a job payload).
//! Everything the stager writes is first normalized to a single byte
//! representation here; a value that cannot be normalized is a contract
//! violation and fails the whole request before any staging side effect.

use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Mapping from virtual path to input content. Keys are unique by
/// construction.
pub type InputMap = BTreeMap<String, InputValue>;

/// One named input buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Text, written as UTF-8.
    Text(String),
    /// Raw bytes, written as-is.
    Bytes(Vec<u8>),
    /// A dynamically typed value: a JSON string is treated as text, a JSON
    /// array of integers in `0..=255` is treated as a byte buffer. Anything
    /// else is an unsupported input type.
    Raw(Value),
}

impl InputValue {
    /// Normalizes this value to bytes, or `None` when the type is
    /// unsupported.
    pub fn as_bytes(&self) -> Option<Cow<'_, [u8]>> {
        match self {
            Self::Text(text) => Some(Cow::Borrowed(text.as_bytes())),
            Self::Bytes(bytes) => Some(Cow::Borrowed(bytes)),
            Self::Raw(Value::String(text)) => Some(Cow::Borrowed(text.as_bytes())),
            Self::Raw(Value::Array(items)) => {
                let mut buffer = Vec::with_capacity(items.len());
                for item in items {
                    let byte = item.as_u64().filter(|value| *value <= u8::MAX as u64)?;
                    buffer.push(byte as u8);
                }
                Some(Cow::Owned(buffer))
            }
            Self::Raw(_) => None,
        }
    }
}

impl From<&str> for InputValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for InputValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for InputValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for InputValue {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<Value> for InputValue {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_passes_through() {
        let value = InputValue::from("hello");
        assert_eq!(value.as_bytes().unwrap().as_ref(), b"hello");
    }

    #[test]
    fn test_bytes_pass_through() {
        let value = InputValue::from(vec![0u8, 1, 255]);
        assert_eq!(value.as_bytes().unwrap().as_ref(), &[0u8, 1, 255]);
    }

    #[test]
    fn test_raw_string_is_text() {
        let value = InputValue::from(json!("geojson"));
        assert_eq!(value.as_bytes().unwrap().as_ref(), b"geojson");
    }

    #[test]
    fn test_raw_byte_array_converts() {
        let value = InputValue::from(json!([80, 77, 84]));
        assert_eq!(value.as_bytes().unwrap().as_ref(), b"PMT");
    }

    #[test]
    fn test_raw_number_is_unsupported() {
        assert!(InputValue::from(json!(12345)).as_bytes().is_none());
    }

    #[test]
    fn test_raw_array_with_out_of_range_element_is_unsupported() {
        assert!(InputValue::from(json!([1, 256])).as_bytes().is_none());
        assert!(InputValue::from(json!([1, -1])).as_bytes().is_none());
        assert!(InputValue::from(json!([1, "x"])).as_bytes().is_none());
    }

    #[test]
    fn test_raw_object_is_unsupported() {
        assert!(InputValue::from(json!({"a": 1})).as_bytes().is_none());
    }
}
