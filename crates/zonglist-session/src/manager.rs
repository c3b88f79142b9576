//! Session manager implementing the shared queue protocol.
//!
//! Every operation is a write through the injected store; there is no
//! in-process state shared between clients. Transitions that touch more
//! than one path (promotion, end of track) are issued as a single
//! multi-path update so subscribers never observe a promoted entry in
//! both the queue and `currentTrack`, or in neither.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use zonglist_core::{
    ClientContext, Clock, DriverInfo, PlaybackStatus, QueueEntry, Session, SessionStore,
    StoreError, StorePath, SystemClock, Track, TrackInfo,
    model::{Millis, decode_queue},
    path::{CURRENT_TRACK, LAST_UPDATE, QUEUE, STATUS},
};

use crate::feed::{Feed, SessionEvent, SubtreeKind};

/// Protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Malformed {what} at {path}: {source}")]
    Decode {
        what: &'static str,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProtocolError {
    pub(crate) fn decode(what: &'static str, path: &StorePath, source: serde_json::Error) -> Self {
        Self::Decode {
            what,
            path: path.to_string(),
            source,
        }
    }
}

/// Session manager for one client of the shared queue.
///
/// Cheap to clone; clones share the store and clock.
pub struct SessionManager<S>
where
    S: SessionStore,
{
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    context: ClientContext,
}

impl<S> Clone for SessionManager<S>
where
    S: SessionStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            context: self.context.clone(),
        }
    }
}

impl<S> SessionManager<S>
where
    S: SessionStore,
{
    /// Create a new session manager on the system clock, without identity.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            context: ClientContext::unidentified(),
        }
    }

    /// Use an injected clock for all timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tag writes with the given client identity.
    #[must_use]
    pub fn with_context(mut self, context: ClientContext) -> Self {
        self.context = context;
        self
    }

    /// A manager for another client sharing this store and clock.
    #[must_use]
    pub fn for_client(&self, context: ClientContext) -> Self {
        self.clone().with_context(context)
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub const fn context(&self) -> &ClientContext {
        &self.context
    }

    fn now(&self) -> Millis {
        self.clock.now_millis()
    }

    /// Start a session, overwriting any existing state for it.
    ///
    /// Call once per session start, not on reconnect: the queue and
    /// current track are destroyed.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn initialize_session(
        &self,
        session_id: &str,
        driver_info: DriverInfo,
    ) -> Result<Session, ProtocolError> {
        let path = StorePath::session(session_id)?;
        let session = Session::fresh(driver_info, self.now());
        self.store
            .write(&path, serde_json::to_value(&session)?)
            .await?;
        tracing::info!(session_id, driver = %session.driver_info.driver_name, "Session initialized");
        Ok(session)
    }

    /// Add a track to the queue.
    ///
    /// Returns the created entry, including its generated key, so callers
    /// need not wait for the subscription round trip.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn enqueue(
        &self,
        session_id: &str,
        info: TrackInfo,
    ) -> Result<QueueEntry, ProtocolError> {
        let now = self.now();
        let entry = QueueEntry {
            entry_key: self.store.push_key(),
            info,
            added_at: now,
            added_by: self.context.identity.clone(),
        };

        let mut fields = Map::new();
        fields.insert(
            format!("{QUEUE}/{}", entry.entry_key),
            serde_json::to_value(&entry)?,
        );
        fields.insert(LAST_UPDATE.to_string(), json!(now));
        self.update_session(session_id, fields).await?;

        tracing::info!(
            session_id,
            entry_key = %entry.entry_key,
            title = %entry.info.title,
            added_by = %entry.added_by,
            "Track enqueued"
        );
        Ok(entry)
    }

    /// Remove one entry. Removing an entry that is already gone succeeds.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn dequeue_by_key(&self, session_id: &str, entry_key: &str) -> Result<(), ProtocolError> {
        // Validates the key before it is spliced into a relative path
        StorePath::queue_entry(session_id, entry_key)?;

        let mut fields = Map::new();
        fields.insert(format!("{QUEUE}/{entry_key}"), Value::Null);
        fields.insert(LAST_UPDATE.to_string(), json!(self.now()));
        self.update_session(session_id, fields).await?;

        tracing::info!(session_id, entry_key, "Entry removed");
        Ok(())
    }

    /// Empty the queue.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn clear_queue(&self, session_id: &str) -> Result<(), ProtocolError> {
        let mut fields = Map::new();
        fields.insert(QUEUE.to_string(), Value::Null);
        fields.insert(LAST_UPDATE.to_string(), json!(self.now()));
        self.update_session(session_id, fields).await?;

        tracing::info!(session_id, "Queue cleared");
        Ok(())
    }

    /// Promote the earliest entry of `snapshot` to the current track.
    ///
    /// The entry with the smallest `addedAt` wins; ties go to the smallest
    /// entry key. An empty snapshot moves the session to idle and returns
    /// `None`.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn promote_next(
        &self,
        session_id: &str,
        snapshot: &[QueueEntry],
    ) -> Result<Option<QueueEntry>, ProtocolError> {
        let Some(next) = snapshot.iter().min_by(|a, b| {
            a.added_at
                .cmp(&b.added_at)
                .then_with(|| a.entry_key.cmp(&b.entry_key))
        }) else {
            self.transition(session_id, None, None).await?;
            tracing::info!(session_id, "Queue is empty, session idle");
            return Ok(None);
        };

        let track = Track::new(next.info.clone(), self.now());
        self.transition(session_id, Some(&track), Some(&next.entry_key))
            .await?;
        tracing::info!(session_id, entry_key = %next.entry_key, title = %next.info.title, "Promoted next entry");
        Ok(Some(next.clone()))
    }

    /// Read the queue and promote its earliest entry (skip).
    ///
    /// # Errors
    /// Returns error if reading or writing the store fails.
    pub async fn advance(&self, session_id: &str) -> Result<Option<QueueEntry>, ProtocolError> {
        let queue = self.read_queue(session_id).await?;
        self.promote_next(session_id, &queue).await
    }

    /// Play a track right away. The queue is left untouched.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn play_immediately(
        &self,
        session_id: &str,
        info: TrackInfo,
    ) -> Result<Track, ProtocolError> {
        let track = Track::new(info, self.now());
        self.transition(session_id, Some(&track), None).await?;
        tracing::info!(session_id, title = %track.info.title, "Playing immediately");
        Ok(track)
    }

    /// Play a specific queued entry now, removing it from the queue in the same update.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn play_from_queue(
        &self,
        session_id: &str,
        entry: &QueueEntry,
    ) -> Result<Track, ProtocolError> {
        StorePath::queue_entry(session_id, &entry.entry_key)?;
        let track = Track::new(entry.info.clone(), self.now());
        self.transition(session_id, Some(&track), Some(&entry.entry_key))
            .await?;
        tracing::info!(session_id, entry_key = %entry.entry_key, "Playing queued entry");
        Ok(track)
    }

    /// Signal natural end of playback: clear the current track.
    ///
    /// # Errors
    /// Returns error if the store write fails.
    pub async fn finish_current(&self, session_id: &str) -> Result<(), ProtocolError> {
        self.transition(session_id, None, None).await?;
        tracing::info!(session_id, "Current track finished");
        Ok(())
    }

    /// Rewrite `status` if it disagrees with `currentTrack`.
    ///
    /// Returns whether a repair was written.
    ///
    /// # Errors
    /// Returns error if reading or writing the store fails.
    pub async fn reconcile_status(&self, session_id: &str) -> Result<bool, ProtocolError> {
        let Some(session) = self.read_session(session_id).await? else {
            return Ok(false);
        };
        let expected = PlaybackStatus::for_track(session.current_track.as_ref());
        if session.status == expected {
            return Ok(false);
        }

        let mut fields = Map::new();
        fields.insert(STATUS.to_string(), serde_json::to_value(expected)?);
        fields.insert(LAST_UPDATE.to_string(), json!(self.now()));
        self.update_session(session_id, fields).await?;
        tracing::warn!(session_id, status = expected.as_str(), "Repaired playback status");
        Ok(true)
    }

    /// Read the whole session record, if it exists.
    ///
    /// # Errors
    /// Returns error if the read fails or the record is malformed.
    pub async fn read_session(&self, session_id: &str) -> Result<Option<Session>, ProtocolError> {
        let path = StorePath::session(session_id)?;
        let value = self.store.read(&path).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProtocolError::decode("session", &path, e))
    }

    /// Read the queue in playback order.
    ///
    /// # Errors
    /// Returns error if the read fails or an entry is malformed.
    pub async fn read_queue(&self, session_id: &str) -> Result<Vec<QueueEntry>, ProtocolError> {
        let path = StorePath::queue(session_id)?;
        let value = self.store.read(&path).await?;
        decode_queue(value).map_err(|e| ProtocolError::decode("queue", &path, e))
    }

    /// Read the current track.
    ///
    /// # Errors
    /// Returns error if the read fails or the track is malformed.
    pub async fn read_current_track(&self, session_id: &str) -> Result<Option<Track>, ProtocolError> {
        let path = StorePath::current_track(session_id)?;
        let value = self.store.read(&path).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ProtocolError::decode("current track", &path, e))
    }

    /// Subscribe to one subtree of a session.
    ///
    /// # Errors
    /// Returns error if the store rejects the subscription.
    pub async fn subscribe(
        &self,
        session_id: &str,
        kind: SubtreeKind,
    ) -> Result<Feed<SessionEvent>, ProtocolError> {
        let path = kind.path(session_id)?;
        let subscription = self.store.subscribe(&path).await?;
        Ok(Feed::new(subscription, path, move |path, value| {
            SessionEvent::decode(kind, path, value)
        }))
    }

    /// Subscribe to the queue, delivered in playback order.
    ///
    /// # Errors
    /// Returns error if the store rejects the subscription.
    pub async fn subscribe_queue(&self, session_id: &str) -> Result<Feed<Vec<QueueEntry>>, ProtocolError> {
        let path = StorePath::queue(session_id)?;
        let subscription = self.store.subscribe(&path).await?;
        Ok(Feed::new(subscription, path, crate::feed::decode_queue_value))
    }

    /// Subscribe to the current track.
    ///
    /// # Errors
    /// Returns error if the store rejects the subscription.
    pub async fn subscribe_current_track(
        &self,
        session_id: &str,
    ) -> Result<Feed<Option<Track>>, ProtocolError> {
        let path = StorePath::current_track(session_id)?;
        let subscription = self.store.subscribe(&path).await?;
        Ok(Feed::new(subscription, path, crate::feed::decode_track_value))
    }

    /// Subscribe to the playback status.
    ///
    /// # Errors
    /// Returns error if the store rejects the subscription.
    pub async fn subscribe_status(&self, session_id: &str) -> Result<Feed<PlaybackStatus>, ProtocolError> {
        let path = StorePath::status(session_id)?;
        let subscription = self.store.subscribe(&path).await?;
        Ok(Feed::new(subscription, path, crate::feed::decode_status_value))
    }

    /// Set or clear the current track, keeping `status` in step, and
    /// optionally remove the queue entry it came from. One update.
    async fn transition(
        &self,
        session_id: &str,
        track: Option<&Track>,
        remove_key: Option<&str>,
    ) -> Result<(), ProtocolError> {
        let mut fields = Map::new();
        fields.insert(CURRENT_TRACK.to_string(), serde_json::to_value(track)?);
        fields.insert(
            STATUS.to_string(),
            serde_json::to_value(PlaybackStatus::for_track(track))?,
        );
        if let Some(key) = remove_key {
            // A key with `/` or an empty key would address another node
            StorePath::queue_entry(session_id, key)?;
            fields.insert(format!("{QUEUE}/{key}"), Value::Null);
        }
        fields.insert(LAST_UPDATE.to_string(), json!(self.now()));
        self.update_session(session_id, fields).await
    }

    async fn update_session(
        &self,
        session_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), ProtocolError> {
        let path = StorePath::session(session_id)?;
        self.store.update(&path, fields).await.map_err(|e| {
            tracing::error!(session_id, error = %e, "Session update failed");
            ProtocolError::from(e)
        })
    }
}
