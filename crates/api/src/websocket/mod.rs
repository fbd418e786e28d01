//! WebSocket support for real-time updates
//!
//! Provides the real-time notification fan-out layer for the platform:
//! - Connection registry with per-connection metadata
//! - Channel-based publish/subscribe for targeted broadcast
//! - Broadcast-all delivery for platform alerts
//! - Liveness ping sweep and stale-connection eviction
//!
//! # Architecture
//!
//! - **Connection**: one live socket with a single-writer outbound queue
//! - **Registry**: owns the live set and channel subscriptions behind one lock
//! - **Handler**: Axum WebSocket route handler feeding the registry
//! - **Events**: type-safe wire events for client/server communication
//! - **Maintenance**: background ping and eviction timers

pub mod connection;
pub mod events;
pub mod handler;
pub mod maintenance;
pub mod registry;

pub use handler::ws_handler;
pub use registry::{WebSocketState, WebSocketStats};
