//! Typed subscription feeds over session subtrees.

use std::fmt;

use futures::{StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use zonglist_core::{
    PlaybackStatus, QueueEntry, StoreError, StorePath, Subscription, Track, model::decode_queue,
};

use crate::manager::ProtocolError;

/// Subtree of a session a client can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtreeKind {
    Queue,
    CurrentTrack,
    Status,
}

impl SubtreeKind {
    pub const ALL: [Self; 3] = [Self::Queue, Self::CurrentTrack, Self::Status];

    /// Store path of this subtree for a session.
    ///
    /// # Errors
    /// Returns error if the session id is not a valid key.
    pub fn path(self, session_id: &str) -> Result<StorePath, StoreError> {
        match self {
            Self::Queue => StorePath::queue(session_id),
            Self::CurrentTrack => StorePath::current_track(session_id),
            Self::Status => StorePath::status(session_id),
        }
    }
}

/// A decoded subtree value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Full queue in playback order.
    Queue(Vec<QueueEntry>),
    CurrentTrack(Option<Track>),
    Status(PlaybackStatus),
}

impl SessionEvent {
    pub(crate) fn decode(
        kind: SubtreeKind,
        path: &StorePath,
        value: Value,
    ) -> Result<Self, ProtocolError> {
        Ok(match kind {
            SubtreeKind::Queue => Self::Queue(decode_queue_value(path, value)?),
            SubtreeKind::CurrentTrack => Self::CurrentTrack(decode_track_value(path, value)?),
            SubtreeKind::Status => Self::Status(decode_status_value(path, value)?),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> SubtreeKind {
        match self {
            Self::Queue(_) => SubtreeKind::Queue,
            Self::CurrentTrack(_) => SubtreeKind::CurrentTrack,
            Self::Status(_) => SubtreeKind::Status,
        }
    }
}

pub(crate) fn decode_queue_value(
    path: &StorePath,
    value: Value,
) -> Result<Vec<QueueEntry>, ProtocolError> {
    decode_queue(value).map_err(|e| ProtocolError::decode("queue", path, e))
}

pub(crate) fn decode_track_value(
    path: &StorePath,
    value: Value,
) -> Result<Option<Track>, ProtocolError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ProtocolError::decode("current track", path, e))
}

pub(crate) fn decode_status_value(
    path: &StorePath,
    value: Value,
) -> Result<PlaybackStatus, ProtocolError> {
    if value.is_null() {
        return Ok(PlaybackStatus::Idle);
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::decode("status", path, e))
}

type Decoder<T> = Box<dyn Fn(&StorePath, Value) -> Result<T, ProtocolError> + Send + Sync>;

/// Typed view of a store subscription.
///
/// The first item is the current value; later items follow every change.
/// Dropping the feed disposes the store-side listener.
pub struct Feed<T> {
    subscription: Subscription,
    path: StorePath,
    decode: Decoder<T>,
}

impl<T> Feed<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(
        subscription: Subscription,
        path: StorePath,
        decode: impl Fn(&StorePath, Value) -> Result<T, ProtocolError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            subscription,
            path,
            decode: Box::new(decode),
        }
    }

    #[must_use]
    pub const fn path(&self) -> &StorePath {
        &self.path
    }

    /// Next decoded value, or `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Result<T, ProtocolError>> {
        let value = self.subscription.recv().await?;
        Some((self.decode)(&self.path, value))
    }

    /// Stop listening.
    pub fn unsubscribe(self) {
        self.subscription.unsubscribe();
    }

    /// Convert into a stream of decoded values.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, Result<T, ProtocolError>> {
        let Self {
            subscription,
            path,
            decode,
        } = self;
        subscription.map(move |value| decode(&path, value)).boxed()
    }

    /// Invoke `callback` for every value on a background task.
    ///
    /// The returned listener must be kept alive; dropping it stops the
    /// task and disposes the store-side listener.
    #[must_use]
    pub fn spawn_callback<F>(mut self, mut callback: F) -> Listener
    where
        F: FnMut(Result<T, ProtocolError>) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            while let Some(item) = self.next().await {
                callback(item);
            }
        });
        Listener { handle }
    }
}

impl<T> fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feed")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Background callback registration returned by [`Feed::spawn_callback`].
#[derive(Debug)]
pub struct Listener {
    handle: JoinHandle<()>,
}

impl Listener {
    /// Stop the callback and dispose the subscription.
    pub fn dispose(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
