//! Core trait for the realtime session store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{StorePath, Subscription};

/// Store error.
///
/// Deleting a path that does not exist is not an error; stores report success.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Network, permission or quota failure while mutating.
    #[error("Store write failed at {path}: {reason}")]
    WriteFailure { path: String, reason: String },
    /// Failure reading a value or delivering a subscription.
    #[error("Store read failed at {path}: {reason}")]
    ReadFailure { path: String, reason: String },
    /// A path segment is not a valid key.
    #[error("Invalid store path segment: {0:?}")]
    InvalidPath(String),
}

impl StoreError {
    /// Write failure at `path`.
    pub fn write(path: &StorePath, reason: impl Into<String>) -> Self {
        Self::WriteFailure {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Read failure at `path`.
    pub fn read(path: &StorePath, reason: impl Into<String>) -> Self {
        Self::ReadFailure {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for realtime tree stores shared by every client.
///
/// A value of `Null` means "absent"; writing `Null` or an empty object
/// removes the node. Last write wins per path.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the current value at a path (`Null` if absent).
    async fn read(&self, path: &StorePath) -> Result<Value, StoreError>;

    /// Replace the value at a path.
    async fn write(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Multi-path update below `path`.
    ///
    /// Each key of `fields` is a relative path whose node is replaced
    /// wholesale (`Null` deletes it). All children are applied as one
    /// atomic change.
    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Remove a path. Succeeds if the path is already absent.
    async fn delete(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Generate a unique, chronologically sortable child key.
    fn push_key(&self) -> String;

    /// Listen to a subtree.
    ///
    /// The current value is delivered immediately, then every distinct
    /// subsequent value for as long as the subscription lives.
    async fn subscribe(&self, path: &StorePath) -> Result<Subscription, StoreError>;
}
