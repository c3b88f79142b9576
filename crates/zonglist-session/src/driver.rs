//! Driver-side auto-advance.
//!
//! The store has no triggers, so the driver client is the only party that
//! moves playback forward when a track ends. This controller watches
//! `currentTrack`; when it goes from present to absent it waits, re-reads
//! the session and promotes the next entry only if nothing is playing by
//! then. Redundant triggers are therefore harmless.

use std::time::Duration;

use tokio::task::JoinHandle;
use zonglist_core::{SessionStore, Track};

use crate::manager::{ProtocolError, SessionManager};

/// Default pause between observing the end of a track and promoting.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_secs(1);

/// Auto-advance settings.
#[derive(Debug, Clone)]
pub struct AutoAdvanceConfig {
    /// Delay before re-reading the session after a track ends.
    pub delay: Duration,
}

impl Default for AutoAdvanceConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}

/// Running auto-advance task. Dropping it stops the task.
#[derive(Debug)]
pub struct AutoAdvance {
    handle: JoinHandle<()>,
}

impl AutoAdvance {
    /// Start watching a session.
    ///
    /// # Errors
    /// Returns error if the current-track subscription cannot be created.
    pub async fn spawn<S>(
        manager: SessionManager<S>,
        session_id: impl Into<String>,
        config: AutoAdvanceConfig,
    ) -> Result<Self, ProtocolError>
    where
        S: SessionStore + 'static,
    {
        let session_id = session_id.into();
        let mut feed = manager.subscribe_current_track(&session_id).await?;
        tracing::info!(%session_id, delay = ?config.delay, "Auto-advance started");

        let handle = tokio::spawn(async move {
            let mut previous: Option<Track> = None;
            while let Some(event) = feed.next().await {
                let current = match event {
                    Ok(current) => current,
                    Err(e) => {
                        tracing::error!(%session_id, error = %e, "Ignoring malformed current track");
                        continue;
                    }
                };

                match (&previous, &current) {
                    (Some(ended), None) => {
                        tracing::info!(%session_id, title = %ended.info.title, "Track ended");
                        tokio::time::sleep(config.delay).await;
                        if let Err(e) = advance_if_idle(&manager, &session_id).await {
                            tracing::error!(%session_id, error = %e, "Auto-advance failed");
                        }
                    }
                    (_, Some(_)) => {
                        if let Err(e) = manager.reconcile_status(&session_id).await {
                            tracing::error!(%session_id, error = %e, "Status repair failed");
                        }
                    }
                    (None, None) => {}
                }
                previous = current;
            }
            tracing::debug!(%session_id, "Auto-advance feed closed");
        });

        Ok(Self { handle })
    }

    /// Stop the task.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for AutoAdvance {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Promote the next entry unless something started playing meanwhile.
///
/// Returns whether a promotion was written.
async fn advance_if_idle<S>(manager: &SessionManager<S>, session_id: &str) -> Result<bool, ProtocolError>
where
    S: SessionStore,
{
    let Some(session) = manager.read_session(session_id).await? else {
        return Ok(false);
    };
    if session.current_track.is_some() {
        tracing::debug!(%session_id, "Already playing, skipping auto-advance");
        return Ok(false);
    }

    let queue = session.ordered_queue();
    if queue.is_empty() {
        manager.reconcile_status(session_id).await?;
        return Ok(false);
    }
    Ok(manager.promote_next(session_id, &queue).await?.is_some())
}
