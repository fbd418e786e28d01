//! Background maintenance for the connection registry
//!
//! Two independent timers: a liveness sweep that pings every connection and
//! stamps the ones that accept, and a staleness eviction pass that drops
//! connections whose last confirmed liveness is too old. The cadences are
//! configured separately so operators can tune them independently.

use std::time::Duration;

use super::registry::WebSocketState;
use crate::config::Config;

/// Spawn the ping and eviction loops as detached tokio tasks
///
/// A tick that does nothing (no connections, nothing stale) is a no-op, so
/// both loops are safe to run at any cadence. Neither loop can terminate
/// early: registry operations absorb transport failures internally.
pub fn spawn_maintenance_tasks(ws_state: WebSocketState, config: &Config) {
    let ping_interval = config.ping_interval();
    let eviction_interval = config.eviction_interval();
    let stale_after = config.stale_after();

    let ping_state = ws_state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        loop {
            ticker.tick().await;
            ping_state.ping_connections().await;
        }
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(eviction_interval);
        loop {
            ticker.tick().await;
            run_eviction_tick(&ws_state, stale_after).await;
        }
    });

    tracing::info!(
        ping_interval_secs = ping_interval.as_secs(),
        eviction_interval_secs = eviction_interval.as_secs(),
        stale_after_secs = stale_after.as_secs(),
        "WebSocket maintenance tasks started"
    );
}

/// One eviction pass with its own log line
async fn run_eviction_tick(ws_state: &WebSocketState, stale_after: Duration) {
    let before = ws_state.connection_count().await;
    ws_state.evict_stale(stale_after).await;
    let after = ws_state.connection_count().await;
    if after < before {
        tracing::info!(evicted = before - after, "Stale connection eviction pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::Connection;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_eviction_tick_is_idempotent() {
        let state = WebSocketState::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        state.add_connection(Connection::new(tx)).await;

        run_eviction_tick(&state, Duration::from_secs(3600)).await;
        run_eviction_tick(&state, Duration::from_secs(3600)).await;

        assert_eq!(state.connection_count().await, 1);
    }
}
