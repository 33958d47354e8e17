//! Edit-lock WebSocket infrastructure.
//!
//! Provides the coordinator tracking per-connection page claims, the HTTP
//! upgrade handler used by Axum routes, and the heartbeat/idle-sweep task.

pub mod coordinator;
mod handler;
mod heartbeat;

pub use coordinator::EditLockCoordinator;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
