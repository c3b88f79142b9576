//! Shared queue/session protocol for the ride queue.
//!
//! Provides:
//! - `SessionManager` - Queue mutation and playback transitions
//! - `Feed` - Typed subtree subscriptions
//! - `AutoAdvance` - Driver-side end-of-track promotion
//! - Store implementations (memory)

pub mod driver;
pub mod feed;
pub mod manager;
pub mod storage;

pub use driver::{AutoAdvance, AutoAdvanceConfig};
pub use feed::{Feed, Listener, SessionEvent, SubtreeKind};
pub use manager::{ProtocolError, SessionManager};
