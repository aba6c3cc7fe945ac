//! Write payloads (bookings, feedback) and their receipts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::serde_helpers::{id_string, lenient_opt, opt_id_string};

/// Booking submitted from checkout. Forwarded to the backend as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Cart lines; their shape belongs to the pricing layer.
    #[serde(default)]
    pub items: Vec<Value>,
    pub total: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Booking as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Feedback or comment left on an event page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub event_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Backend acknowledgement of a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Absent on bare acknowledgements; treated as success.
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

const fn default_success() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn transaction_request_serializes_camel_case_with_extras() {
        let mut extra = Map::new();
        extra.insert("promoCode".into(), json!("EARLY"));
        let request = TransactionRequest {
            customer_name: "Ayu".into(),
            customer_email: "ayu@example.com".into(),
            customer_phone: None,
            items: vec![json!({"destinationId": "7", "qty": 2})],
            total: 300.0,
            extra,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["customerName"], "Ayu");
        assert_eq!(body["promoCode"], "EARLY");
        assert!(body.get("customerPhone").is_none());
    }

    #[test]
    fn receipt_defaults_to_success() {
        let receipt: SubmissionReceipt = serde_json::from_value(json!({"id": 991})).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.id.as_deref(), Some("991"));

        let failed: SubmissionReceipt =
            serde_json::from_value(json!({"success": false, "message": "sold out"})).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("sold out"));
    }

    #[test]
    fn feedback_accepts_numeric_ids_and_string_rating() {
        let feedback: Feedback =
            serde_json::from_value(json!({"id": 3, "eventId": 12, "name": "Rio", "rating": "5", "comment": "great"}))
                .unwrap();
        assert_eq!(feedback.event_id.as_deref(), Some("12"));
        assert_eq!(feedback.rating, Some(5));
    }
}
