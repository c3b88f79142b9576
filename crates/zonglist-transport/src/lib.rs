//! Transport layer for driver and passenger clients.
//!
//! Provides:
//! - Wire protocol (tagged JSON)
//! - Message dispatch onto the session protocol
//! - WebSocket relay (feature: websocket)

pub mod dispatch;
pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use dispatch::dispatch;
pub use protocol::{ClientMessage, ServerMessage};
