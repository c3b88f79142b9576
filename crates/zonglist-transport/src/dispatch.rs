//! Maps client requests onto session operations.

use zonglist_core::SessionStore;
use zonglist_resolver::MetadataResolver;
use zonglist_session::SessionManager;

use crate::protocol::{ClientMessage, ServerMessage};

/// Handle one client message and produce the direct reply.
///
/// State changes are not echoed here; every client sees them through its
/// subscriptions. Failures become [`ServerMessage::Error`].
pub async fn dispatch<S>(
    manager: &SessionManager<S>,
    resolver: &dyn MetadataResolver,
    session_id: &str,
    msg: ClientMessage,
) -> ServerMessage
where
    S: SessionStore,
{
    let result = match msg {
        ClientMessage::Ping => return ServerMessage::Pong,
        ClientMessage::Search { query } => match resolver.search(&query).await {
            Ok(results) => Ok(ServerMessage::SearchResults { query, results }),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Search failed");
                return ServerMessage::error(e);
            }
        },
        ClientMessage::Enqueue { track } => manager
            .enqueue(session_id, track)
            .await
            .map(|entry| ServerMessage::Enqueued { entry }),
        ClientMessage::PlayNow { track } => manager
            .play_immediately(session_id, track)
            .await
            .map(|track| ServerMessage::Playing { track }),
        ClientMessage::PlayEntry { entry_key } => {
            return play_entry(manager, session_id, &entry_key).await;
        }
        ClientMessage::PlayNext => manager
            .advance(session_id)
            .await
            .map(|entry| ServerMessage::Promoted { entry }),
        ClientMessage::Remove { entry_key } => manager
            .dequeue_by_key(session_id, &entry_key)
            .await
            .map(|()| ServerMessage::Ok),
        ClientMessage::Clear => manager
            .clear_queue(session_id)
            .await
            .map(|()| ServerMessage::Ok),
        ClientMessage::TrackEnded => manager
            .finish_current(session_id)
            .await
            .map(|()| ServerMessage::Ok),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(session_id, error = %e, "Request failed");
        ServerMessage::error(e)
    })
}

async fn play_entry<S>(manager: &SessionManager<S>, session_id: &str, entry_key: &str) -> ServerMessage
where
    S: SessionStore,
{
    let queue = match manager.read_queue(session_id).await {
        Ok(queue) => queue,
        Err(e) => return ServerMessage::error(e),
    };
    let Some(entry) = queue.into_iter().find(|e| e.entry_key == entry_key) else {
        return ServerMessage::error(format!("queue entry {entry_key} not found"));
    };
    match manager.play_from_queue(session_id, &entry).await {
        Ok(track) => ServerMessage::Playing { track },
        Err(e) => ServerMessage::error(e),
    }
}
