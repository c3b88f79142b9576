//! Video metadata resolution for the ride queue.
//!
//! Provides:
//! - `MetadataResolver` trait and a fixed-catalogue implementation
//! - ISO-8601 duration normalization for display
//! - YouTube Data API client (feature: youtube)

pub mod duration;
pub mod error;
pub mod resolver;

#[cfg(feature = "youtube")]
pub mod youtube;

pub use duration::normalize_duration;
pub use error::ResolverError;
pub use resolver::{MetadataResolver, StaticResolver};

#[cfg(feature = "youtube")]
pub use youtube::{YouTubeClient, YouTubeClientBuilder};
