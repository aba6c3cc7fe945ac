//! Response envelope decoding
//!
//! The backend answers list reads in one of three shapes:
//!
//! - a bare array: `[{...}, {...}]`
//! - a data envelope: `{"data": [...]}`
//! - a status envelope: `{"success": true, "data": [...]}` (where `data` may
//!   also be a single object)
//!
//! Decoding fails closed. An unknown shape yields no records and items that
//! do not deserialize are skipped; both are logged.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;
use tripline_domain::{FetchError, Listing, SubmissionReceipt};

/// Pull the record list out of any accepted envelope.
///
/// `None` when the shape is not recognised or the backend reported
/// `success: false`.
fn items(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map.get("message").and_then(Value::as_str).unwrap_or("no message");
                warn!(message, "backend reported failure in list response");
                return None;
            }
            match map.remove("data") {
                Some(Value::Array(items)) => Some(items),
                Some(item @ Value::Object(_)) => Some(vec![item]),
                Some(Value::Null) | None if map.contains_key("success") => Some(Vec::new()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Decode every record in a list response.
pub fn decode_list<T: DeserializeOwned>(body: Value) -> Vec<T> {
    let Some(items) = items(body) else {
        warn!("unrecognised response envelope, returning no records");
        return Vec::new();
    };

    let total = items.len();
    let decoded: Vec<T> = items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect();
    let skipped = total - decoded.len();
    if skipped > 0 {
        warn!(skipped, total, "skipped records that failed to decode");
    }
    decoded
}

/// First decoded record matching `predicate`.
pub fn decode_match<T, P>(body: Value, predicate: P) -> Option<T>
where
    T: DeserializeOwned + Listing,
    P: Fn(&T) -> bool,
{
    decode_list(body).into_iter().find(|item| predicate(item))
}

/// Pass a read body through unless it is a `success: false` envelope.
///
/// The backend reports failures as HTTP 200, so this runs per attempt,
/// before anything reaches the cache.
///
/// # Errors
///
/// A retryable payload error carrying the backend message.
pub fn ensure_read_succeeded(body: Value) -> Result<Value, FetchError> {
    match failure_message(&body) {
        Some(message) => Err(FetchError::payload(message)),
        None => Ok(body),
    }
}

fn failure_message(body: &Value) -> Option<String> {
    if body.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let message = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("request rejected by backend");
    Some(message.to_string())
}

/// Interpret the response to a write.
///
/// # Errors
///
/// `FetchError::Rejected` when the backend answered `success: false`.
pub fn decode_receipt(body: Value) -> Result<SubmissionReceipt, FetchError> {
    if let Some(message) = failure_message(&body) {
        return Err(FetchError::Rejected { message });
    }

    if body.is_object() {
        if let Ok(receipt) = serde_json::from_value::<SubmissionReceipt>(body.clone()) {
            return Ok(receipt);
        }
    }
    Ok(SubmissionReceipt { success: true, message: None, id: None, data: Some(body) })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tripline_domain::Destination;

    use super::*;

    fn beach() -> Value {
        json!({"id": 1, "slug": "beach", "name": "Beach"})
    }

    #[test]
    fn accepts_all_three_list_shapes() {
        let bare: Vec<Destination> = decode_list(json!([beach()]));
        let data: Vec<Destination> = decode_list(json!({"data": [beach()]}));
        let status: Vec<Destination> = decode_list(json!({"success": true, "data": [beach()]}));

        assert_eq!(bare.len(), 1);
        assert_eq!(bare, data);
        assert_eq!(data, status);
        assert_eq!(bare[0].id, "1");
    }

    #[test]
    fn single_object_data_is_one_record() {
        let found: Vec<Destination> = decode_list(json!({"success": true, "data": beach()}));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn unknown_shapes_fail_closed() {
        assert!(decode_list::<Destination>(json!({"rows": [beach()]})).is_empty());
        assert!(decode_list::<Destination>(json!("nope")).is_empty());
        assert!(decode_list::<Destination>(json!({"success": false, "data": [beach()]})).is_empty());
        assert!(decode_list::<Destination>(json!({"success": true})).is_empty());
    }

    #[test]
    fn undecodable_items_are_skipped() {
        let found: Vec<Destination> = decode_list(json!([beach(), {"name": "no id"}, 42]));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn match_filters_by_predicate() {
        let body = json!([beach(), {"id": 2, "slug": "forest", "name": "Forest"}]);
        let found: Option<Destination> = decode_match(body.clone(), |d: &Destination| d.slug() == "forest");
        assert_eq!(found.map(|d| d.id), Some("2".to_string()));
        assert!(decode_match(body, |d: &Destination| d.slug() == "desert").is_none());
    }

    #[test]
    fn failed_read_envelope_is_a_retryable_payload_error() {
        let err = ensure_read_succeeded(json!({"success": false, "message": "quota exceeded"})).unwrap_err();
        assert_eq!(err.kind(), tripline_domain::FetchErrorKind::Payload);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("quota exceeded"));

        let body = json!({"success": true, "data": [beach()]});
        assert_eq!(ensure_read_succeeded(body.clone()).unwrap(), body);
        assert_eq!(ensure_read_succeeded(json!([beach()])).unwrap(), json!([beach()]));
    }

    #[test]
    fn receipt_rejection_and_passthrough() {
        let rejected = decode_receipt(json!({"success": false, "message": "sold out"})).unwrap_err();
        assert_eq!(rejected, FetchError::Rejected { message: "sold out".into() });

        let receipt = decode_receipt(json!({"success": true, "id": 77, "message": "ok"})).unwrap();
        assert_eq!(receipt.id.as_deref(), Some("77"));

        let bare = decode_receipt(json!(["raw"])).unwrap();
        assert!(bare.success);
        assert_eq!(bare.data, Some(json!(["raw"])));
    }
}
