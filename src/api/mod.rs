//! HTTP + WebSocket surface for the session engine.
//!
//! The UI (out of scope here) opens a session over HTTP, streams the
//! live transcript over a WebSocket, and receives engine events back on
//! the same socket. Suggestion actions (accept/dismiss/clear) are plain
//! HTTP posts. The router is composable; `api_router()` returns a
//! `Router` that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
