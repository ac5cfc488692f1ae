// This file contains data structures shared across the Ordino crates:
// the device registration row, the order notification payload carried from
// the trigger through FCM to the client, and the client-side push message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered push-capable device.
///
/// One row per installed client instance. The FCM token is the natural key:
/// the registry upserts on it, so a refreshed token overwrites its own row
/// and a token can never be registered twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRegistration {
    /// The unique identifier for this registration
    pub id: Option<i64>,

    /// The FCM registration token, unique across the registry
    pub fcm_token: String,

    /// The owning user, if any. Anonymous admin devices register with no user.
    pub user_id: Option<String>,

    /// Platform tag ("android", "ios", "web")
    pub platform: Option<String>,

    /// The timestamp when this registration was created
    pub created_at: Option<DateTime<Utc>>,

    /// The timestamp when this registration was last updated
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceRegistration {
    /// Create a new device registration for the given token.
    pub fn new(fcm_token: String, user_id: Option<String>, platform: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            fcm_token,
            user_id,
            platform,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

fn default_event_type() -> String {
    "new_order".to_string()
}

/// The order event carried from the trigger to every notified device.
///
/// `order_id` and `order_number` are mandatory; everything else is optional
/// and defensively defaulted. Unknown keys land in `extra` rather than being
/// dropped, so forward-compatible trigger payloads survive the round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OrderNotificationPayload {
    #[serde(default)]
    pub order_id: String,

    #[serde(default)]
    pub order_number: String,

    #[serde(default)]
    pub customer_name: String,

    /// Decimal string, e.g. "19.50"
    #[serde(default)]
    pub total_amount: String,

    /// "delivery" or "pickup"
    #[serde(default)]
    pub order_type: String,

    #[serde(default)]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(rename = "type", default = "default_event_type")]
    pub event_type: String,

    /// Open-ended extension fields, passed through as provider data strings.
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl OrderNotificationPayload {
    /// Whether the mandatory identifiers are present.
    pub fn has_required_fields(&self) -> bool {
        !self.order_id.is_empty() && !self.order_number.is_empty()
    }
}

/// A push message as delivered to the client by the platform channel.
///
/// Title and body come from the provider notification block and may be
/// absent for data-only messages; `data` carries the string key/value map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_defaults_missing_fields() {
        let payload: OrderNotificationPayload =
            serde_json::from_str(r#"{"order_id": "o1", "order_number": "A100"}"#).unwrap();
        assert!(payload.has_required_fields());
        assert_eq!(payload.customer_name, "");
        assert_eq!(payload.event_type, "new_order");
        assert!(payload.payment_method.is_none());
    }

    #[test]
    fn payload_without_order_id_fails_validation() {
        let payload: OrderNotificationPayload =
            serde_json::from_str(r#"{"order_number": "A100"}"#).unwrap();
        assert!(!payload.has_required_fields());
    }

    #[test]
    fn unknown_keys_are_kept_as_extension_fields() {
        let payload: OrderNotificationPayload = serde_json::from_str(
            r#"{"order_id": "o1", "order_number": "A100", "table_number": "12"}"#,
        )
        .unwrap();
        assert_eq!(payload.extra.get("table_number").map(String::as_str), Some("12"));
    }
}
