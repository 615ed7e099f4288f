//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// The JSON:API media type, sent as both `Accept` and `Content-Type`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use ferry_core::to_json;
///
/// let bytes = to_json(&serde_json::json!({ "data": null })).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"data":null}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to a query string.
///
/// # Errors
///
/// Returns an error if query serialization fails.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use ferry_core::to_query_string;
///
/// let mut params = BTreeMap::new();
/// params.insert("include", "author");
/// params.insert("filter[id]", "1,2");
/// let query = to_query_string(&params).expect("serialize");
/// assert_eq!(query, "filter%5Bid%5D=1%2C2&include=author");
/// ```
pub fn to_query_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "data.attributes").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
