//! Football tournament server.
//!
//! Exposes the tournament manager over HTTP and pushes live tournament views
//! over WebSockets. The binary in `main.rs` wires configuration, storage
//! backend and router together.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
