//! EV Charging Analytics API Library
//!
//! This crate contains the API server components for the EV charging
//! analytics platform, centered on the real-time notification fan-out
//! layer (connection registry + channel publish/subscribe).

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
