//! WebSocket event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization. Every server event carries an
//! RFC-3339 `timestamp` field alongside its `type` tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Welcome message sent on every new connection
pub const WELCOME_MESSAGE: &str = "Connected to EV Charging Analytics Platform";

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
///
/// Frames with a `type` the server does not understand deserialize to
/// [`ClientEvent::Unknown`] and are ignored without an error response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Subscribe to a named broadcast channel
    Subscribe { channel: String },

    /// Unsubscribe from a named broadcast channel
    Unsubscribe { channel: String },

    /// Any unrecognized event type
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection acknowledged (sent once after accept)
    ConnectionEstablished {
        message: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Channel subscription confirmed
    SubscriptionConfirmed {
        channel: String,
        message: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Channel unsubscription confirmed
    UnsubscriptionConfirmed {
        channel: String,
        message: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Real-time charging metrics pushed by the analytics layer
    RealtimeMetrics {
        data: Value,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Session/data ingestion update notification
    DataUpdate {
        update_type: String,
        data: Value,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// ML model training/deployment status change
    ModelUpdate {
        model_name: String,
        status: String,
        details: Value,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Platform alert (delivered to every connection)
    Alert {
        alert_type: String,
        message: String,
        severity: String,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Liveness ping
    Ping {
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },
}

impl ServerEvent {
    /// Welcome payload sent once to each newly accepted connection
    pub fn connection_established() -> Self {
        Self::ConnectionEstablished {
            message: WELCOME_MESSAGE.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Confirmation payload for a completed subscribe
    pub fn subscription_confirmed(channel: &str) -> Self {
        Self::SubscriptionConfirmed {
            channel: channel.to_string(),
            message: format!("Subscribed to {channel}"),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Confirmation payload for a completed unsubscribe
    pub fn unsubscription_confirmed(channel: &str) -> Self {
        Self::UnsubscriptionConfirmed {
            channel: channel.to_string(),
            message: format!("Unsubscribed from {channel}"),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Metrics payload for the `realtime_metrics` channel
    pub fn realtime_metrics(data: Value) -> Self {
        Self::RealtimeMetrics {
            data,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Data update payload for the `data_updates` channel
    pub fn data_update(update_type: &str, data: Value) -> Self {
        Self::DataUpdate {
            update_type: update_type.to_string(),
            data,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Model update payload for the `model_updates` channel
    pub fn model_update(model_name: &str, status: &str, details: Value) -> Self {
        Self::ModelUpdate {
            model_name: model_name.to_string(),
            status: status.to_string(),
            details,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Alert payload broadcast to all connections
    pub fn alert(alert_type: &str, message: &str, severity: &str) -> Self {
        Self::Alert {
            alert_type: alert_type.to_string(),
            message: message.to_string(),
            severity: severity.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Liveness ping payload
    pub fn ping() -> Self {
        Self::Ping {
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_deserialization() {
        let json = r#"{"type":"subscribe","channel":"realtime_metrics"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::Subscribe { channel } => assert_eq!(channel, "realtime_metrics"),
            _ => panic!("Expected Subscribe event"),
        }

        let json = r#"{"type":"unsubscribe","channel":"data_updates"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::Unsubscribe { channel } => assert_eq!(channel, "data_updates"),
            _ => panic!("Expected Unsubscribe event"),
        }
    }

    #[test]
    fn test_unknown_client_event_is_tolerated() {
        let json = r#"{"type":"make_coffee","channel":"kitchen"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::Unknown));
    }

    #[test]
    fn test_subscribe_without_channel_is_rejected() {
        let json = r#"{"type":"subscribe"}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn test_welcome_event_serialization() {
        let json = serde_json::to_value(ServerEvent::connection_established()).unwrap();
        assert_eq!(json["type"], "connection_established");
        assert_eq!(json["message"], WELCOME_MESSAGE);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_subscription_confirmed_serialization() {
        let json = serde_json::to_value(ServerEvent::subscription_confirmed("alerts")).unwrap();
        assert_eq!(json["type"], "subscription_confirmed");
        assert_eq!(json["channel"], "alerts");
        assert_eq!(json["message"], "Subscribed to alerts");
    }

    #[test]
    fn test_alert_serialization() {
        let json =
            serde_json::to_value(ServerEvent::alert("capacity", "Station 12 at 95%", "warning"))
                .unwrap();
        assert_eq!(json["type"], "alert");
        assert_eq!(json["alert_type"], "capacity");
        assert_eq!(json["severity"], "warning");
    }

    #[test]
    fn test_model_update_serialization() {
        let json = serde_json::to_value(ServerEvent::model_update(
            "duration_regressor",
            "trained",
            json!({"r2": 0.91}),
        ))
        .unwrap();
        assert_eq!(json["type"], "model_update");
        assert_eq!(json["model_name"], "duration_regressor");
        assert_eq!(json["status"], "trained");
        assert_eq!(json["details"]["r2"], 0.91);
    }

    #[test]
    fn test_ping_serialization() {
        let json = serde_json::to_value(ServerEvent::ping()).unwrap();
        assert_eq!(json["type"], "ping");
        assert!(json["timestamp"].is_string());
    }
}
