//! Connection registry and fan-out engine
//!
//! Owns the set of live connections, the channel -> subscriber mapping, and
//! per-connection metadata (connect time, subscriptions, last liveness).
//! Both maps live behind one lock so every structural operation is atomic
//! and the registry never exposes a half-updated view: a connection appears
//! in a channel's subscriber set exactly when that channel appears in the
//! connection's own subscription set, and no channel entry outlives its
//! last subscriber.
//!
//! Delivery is best effort. Sends happen outside the lock against a
//! snapshot of recipients; connections whose send fails are collected and
//! disconnected after the pass completes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;
use super::events::ServerEvent;

/// Channel fed by the analytics aggregation layer
pub const CHANNEL_REALTIME_METRICS: &str = "realtime_metrics";
/// Channel fed by the data ingestion layer
pub const CHANNEL_DATA_UPDATES: &str = "data_updates";
/// Channel fed by the ML training pipeline
pub const CHANNEL_MODEL_UPDATES: &str = "model_updates";

/// Registry-side state for one live connection
struct ConnectionState {
    conn: Arc<Connection>,
    subscriptions: HashSet<String>,
    last_ping: OffsetDateTime,
}

/// The two maps every structural operation mutates together
#[derive(Default)]
struct Registry {
    /// All live connections indexed by session_id
    connections: HashMap<Uuid, ConnectionState>,
    /// Channel name -> subscriber session ids
    channels: HashMap<String, HashSet<Uuid>>,
}

impl Registry {
    /// Remove a connection and purge it from every channel it subscribed
    /// to, dropping channel entries that become empty.
    fn remove(&mut self, session_id: &Uuid) -> Option<ConnectionState> {
        let state = self.connections.remove(session_id)?;
        for channel in &state.subscriptions {
            if let Some(subscribers) = self.channels.get_mut(channel) {
                subscribers.remove(session_id);
                if subscribers.is_empty() {
                    self.channels.remove(channel);
                }
            }
        }
        Some(state)
    }
}

/// Shared WebSocket registry handle
///
/// Cloning is cheap; all clones point at the same registry. The instance is
/// owned by `AppState` and passed explicitly to handlers and schedulers.
#[derive(Clone, Default)]
pub struct WebSocketState {
    inner: Arc<RwLock<Registry>>,
}

impl WebSocketState {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted connection and send it the welcome payload
    pub async fn add_connection(&self, conn: Connection) -> Arc<Connection> {
        let conn = Arc::new(conn);
        let total = {
            let mut registry = self.inner.write().await;
            let now = OffsetDateTime::now_utc();
            registry.connections.insert(
                conn.session_id,
                ConnectionState {
                    conn: Arc::clone(&conn),
                    subscriptions: HashSet::new(),
                    last_ping: now,
                },
            );
            registry.connections.len()
        };

        tracing::info!(
            session_id = %conn.session_id,
            total_connections = total,
            "WebSocket connection added"
        );

        self.send_direct(&conn, ServerEvent::connection_established())
            .await;
        conn
    }

    /// Remove a connection and all of its channel memberships
    ///
    /// Idempotent: removing an already-absent connection is a no-op.
    pub async fn remove_connection(&self, session_id: &Uuid) {
        let mut registry = self.inner.write().await;
        if registry.remove(session_id).is_some() {
            tracing::info!(
                session_id = %session_id,
                remaining_connections = registry.connections.len(),
                "WebSocket connection removed"
            );
        }
    }

    /// Subscribe a live connection to a channel and confirm it
    ///
    /// No-op for unregistered connections; idempotent on re-subscribe.
    pub async fn subscribe(&self, session_id: &Uuid, channel: &str) {
        let conn = {
            let mut registry = self.inner.write().await;
            let Some(state) = registry.connections.get_mut(session_id) else {
                tracing::debug!(session_id = %session_id, channel = %channel,
                    "Subscribe for unknown connection ignored");
                return;
            };
            state.subscriptions.insert(channel.to_string());
            let conn = Arc::clone(&state.conn);
            registry
                .channels
                .entry(channel.to_string())
                .or_default()
                .insert(*session_id);
            conn
        };

        tracing::info!(session_id = %session_id, channel = %channel, "Subscribed to channel");
        self.send_direct(&conn, ServerEvent::subscription_confirmed(channel))
            .await;
    }

    /// Unsubscribe a live connection from a channel and confirm it
    ///
    /// No-op for unregistered connections or channels never subscribed;
    /// the channel entry is dropped as soon as its subscriber set empties.
    pub async fn unsubscribe(&self, session_id: &Uuid, channel: &str) {
        let conn = {
            let mut registry = self.inner.write().await;
            let Some(state) = registry.connections.get_mut(session_id) else {
                tracing::debug!(session_id = %session_id, channel = %channel,
                    "Unsubscribe for unknown connection ignored");
                return;
            };
            state.subscriptions.remove(channel);
            let conn = Arc::clone(&state.conn);
            if let Some(subscribers) = registry.channels.get_mut(channel) {
                subscribers.remove(session_id);
                if subscribers.is_empty() {
                    registry.channels.remove(channel);
                }
            }
            conn
        };

        tracing::info!(session_id = %session_id, channel = %channel, "Unsubscribed from channel");
        self.send_direct(&conn, ServerEvent::unsubscription_confirmed(channel))
            .await;
    }

    /// Send an event to exactly one connection
    ///
    /// A transport failure means the writer task is gone; the connection is
    /// evicted and the failure absorbed rather than surfaced to the caller.
    pub async fn send_direct(&self, conn: &Arc<Connection>, event: ServerEvent) {
        if conn.send(event).is_err() {
            tracing::warn!(
                session_id = %conn.session_id,
                "Failed to send to connection (likely closed), evicting"
            );
            self.remove_connection(&conn.session_id).await;
        }
    }

    /// Broadcast an event to every live connection
    ///
    /// Each send is attempted independently; failures are collected during
    /// the pass and the failed connections disconnected afterwards, so one
    /// dead client never affects delivery to the others.
    pub async fn broadcast_all(&self, event: ServerEvent) {
        let recipients: Vec<Arc<Connection>> = {
            let registry = self.inner.read().await;
            registry
                .connections
                .values()
                .map(|state| Arc::clone(&state.conn))
                .collect()
        };
        if recipients.is_empty() {
            return;
        }

        let failed = self.fan_out(&recipients, event).await;
        self.reap(failed).await;
    }

    /// Broadcast an event to the subscribers of one channel
    ///
    /// Silent no-op when the channel has no entry (no subscribers).
    pub async fn broadcast_channel(&self, channel: &str, event: ServerEvent) {
        let recipients: Vec<Arc<Connection>> = {
            let registry = self.inner.read().await;
            let Some(subscribers) = registry.channels.get(channel) else {
                tracing::debug!(channel = %channel, "Broadcast to channel without subscribers");
                return;
            };
            subscribers
                .iter()
                .filter_map(|id| registry.connections.get(id))
                .map(|state| Arc::clone(&state.conn))
                .collect()
        };

        let failed = self.fan_out(&recipients, event).await;
        self.reap(failed).await;
    }

    /// Send to a snapshot of recipients, returning the ids that failed
    async fn fan_out(&self, recipients: &[Arc<Connection>], event: ServerEvent) -> Vec<Uuid> {
        let mut failed = Vec::new();
        for conn in recipients {
            if conn.send(event.clone()).is_err() {
                tracing::warn!(
                    session_id = %conn.session_id,
                    "Failed to send event to connection (likely closed)"
                );
                failed.push(conn.session_id);
            }
        }
        tracing::debug!(
            recipients = recipients.len() - failed.len(),
            failed = failed.len(),
            "Broadcast pass completed"
        );
        failed
    }

    /// Disconnect every connection that failed a broadcast pass
    async fn reap(&self, failed: Vec<Uuid>) {
        for session_id in failed {
            self.remove_connection(&session_id).await;
        }
    }

    /// Liveness sweep: ping every connection, stamping the ones that accept
    ///
    /// Failed pings follow the usual deferred-disconnect policy.
    pub async fn ping_connections(&self) {
        let recipients: Vec<Arc<Connection>> = {
            let registry = self.inner.read().await;
            registry
                .connections
                .values()
                .map(|state| Arc::clone(&state.conn))
                .collect()
        };
        if recipients.is_empty() {
            return;
        }

        let mut alive = Vec::new();
        let mut failed = Vec::new();
        for conn in &recipients {
            if conn.send(ServerEvent::ping()).is_ok() {
                alive.push(conn.session_id);
            } else {
                failed.push(conn.session_id);
            }
        }

        {
            let mut registry = self.inner.write().await;
            let now = OffsetDateTime::now_utc();
            for session_id in &alive {
                if let Some(state) = registry.connections.get_mut(session_id) {
                    state.last_ping = now;
                }
            }
        }

        tracing::debug!(pinged = alive.len(), failed = failed.len(), "Liveness sweep");
        self.reap(failed).await;
    }

    /// Evict connections whose last confirmed liveness is older than
    /// `max_age`, then best-effort close their transports.
    pub async fn evict_stale(&self, max_age: Duration) {
        let cutoff = OffsetDateTime::now_utc() - max_age;
        let stale: Vec<Arc<Connection>> = {
            let registry = self.inner.read().await;
            registry
                .connections
                .values()
                .filter(|state| state.last_ping < cutoff)
                .map(|state| Arc::clone(&state.conn))
                .collect()
        };

        for conn in stale {
            tracing::info!(session_id = %conn.session_id, "Evicting stale WebSocket connection");
            self.remove_connection(&conn.session_id).await;
            // Transport may already be gone; the close frame is best effort.
            conn.close();
        }
    }

    /// Total number of live connections
    pub async fn connection_count(&self) -> usize {
        let registry = self.inner.read().await;
        registry.connections.len()
    }

    /// Read-only snapshot of registry state for introspection
    pub async fn get_stats(&self) -> WebSocketStats {
        let registry = self.inner.read().await;
        let channels = registry
            .channels
            .iter()
            .map(|(channel, subscribers)| (channel.clone(), subscribers.len()))
            .collect();
        let connection_details = registry
            .connections
            .values()
            .map(|state| ConnectionDetails {
                session_id: state.conn.session_id,
                connected_at: state.conn.connected_at,
                subscriptions: state.subscriptions.iter().cloned().collect(),
                last_ping: state.last_ping,
            })
            .collect();

        WebSocketStats {
            total_connections: registry.connections.len(),
            channels,
            connection_details,
        }
    }

    // =========================================================================
    // Collaborator-facing producers
    // =========================================================================

    /// Push aggregated metrics to `realtime_metrics` subscribers
    pub async fn send_realtime_metrics(&self, data: Value) {
        self.broadcast_channel(CHANNEL_REALTIME_METRICS, ServerEvent::realtime_metrics(data))
            .await;
    }

    /// Push an ingestion notification to `data_updates` subscribers
    pub async fn send_data_update(&self, update_type: &str, data: Value) {
        self.broadcast_channel(CHANNEL_DATA_UPDATES, ServerEvent::data_update(update_type, data))
            .await;
    }

    /// Push a model status change to `model_updates` subscribers
    pub async fn send_model_update(&self, model_name: &str, status: &str, details: Value) {
        self.broadcast_channel(
            CHANNEL_MODEL_UPDATES,
            ServerEvent::model_update(model_name, status, details),
        )
        .await;
    }

    /// Push an alert to every connected client
    pub async fn send_alert(&self, alert_type: &str, message: &str, severity: &str) {
        self.broadcast_all(ServerEvent::alert(alert_type, message, severity))
            .await;
    }
}

/// Snapshot of WebSocket registry state
#[derive(Debug, Clone, Serialize)]
pub struct WebSocketStats {
    /// Number of live connections
    pub total_connections: usize,
    /// Subscriber count per channel
    pub channels: HashMap<String, usize>,
    /// Per-connection metadata
    pub connection_details: Vec<ConnectionDetails>,
}

/// Per-connection metadata exposed in stats snapshots
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionDetails {
    pub session_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub connected_at: OffsetDateTime,
    pub subscriptions: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_ping: OffsetDateTime,
}
