//! Core abstractions for the shared ride queue.
//!
//! This crate provides the fundamental building blocks:
//! - `SessionStore` - Realtime tree store interface
//! - `Subscription` - Disposable subtree listener
//! - `Session`, `QueueEntry`, `Track` - Wire data model
//! - `Clock` and `ClientContext` - Injected time and identity

pub mod clock;
pub mod context;
pub mod model;
pub mod path;
pub mod push_id;
pub mod subscription;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::ClientContext;
pub use model::{DriverInfo, PlaybackStatus, QueueEntry, Session, Track, TrackInfo};
pub use path::StorePath;
pub use push_id::PushIdGenerator;
pub use subscription::Subscription;
pub use traits::{SessionStore, StoreError};
