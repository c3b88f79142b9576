//! Wire protocol for client-relay communication.

use serde::{Deserialize, Serialize};
use zonglist_core::{PlaybackStatus, QueueEntry, Track, TrackInfo};
use zonglist_session::SessionEvent;

/// Message from client to relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Search the metadata source.
    Search { query: String },
    /// Add a track to the queue.
    Enqueue { track: TrackInfo },
    /// Play a track right away, leaving the queue alone.
    PlayNow { track: TrackInfo },
    /// Play a queued entry right away.
    PlayEntry { entry_key: String },
    /// Promote the earliest queued entry (skip).
    PlayNext,
    /// Remove a queued entry.
    Remove { entry_key: String },
    /// Empty the queue.
    Clear,
    /// The player finished the current track.
    TrackEnded,
    /// Ping for keepalive.
    Ping,
}

/// Message from relay to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full queue in playback order.
    Queue { entries: Vec<QueueEntry> },
    /// Current track changed.
    CurrentTrack { track: Option<Track> },
    /// Playback status changed.
    Status { status: PlaybackStatus },
    /// Search results.
    SearchResults { query: String, results: Vec<TrackInfo> },
    /// Entry created by this client's enqueue.
    Enqueued { entry: QueueEntry },
    /// Result of a play-next request; `None` when the queue was empty.
    Promoted { entry: Option<QueueEntry> },
    /// Track started by a play-now request.
    Playing { track: Track },
    /// Operation acknowledged.
    Ok,
    /// Error message.
    Error { message: String },
    /// Pong response.
    Pong,
}

impl ServerMessage {
    /// Error message from anything displayable.
    pub fn error(err: impl std::fmt::Display) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Queue(entries) => Self::Queue { entries },
            SessionEvent::CurrentTrack(track) => Self::CurrentTrack { track },
            SessionEvent::Status(status) => Self::Status { status },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "enqueue",
            "track": {
                "videoId": "fJ9rUzIMcZQ",
                "title": "Bohemian Rhapsody",
                "artist": "Queen Official",
                "thumbnail": "https://i.ytimg.com/vi/fJ9rUzIMcZQ/mqdefault.jpg",
                "duration": "5:55"
            }
        }))
        .unwrap();
        let ClientMessage::Enqueue { track } = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(track.video_id, "fJ9rUzIMcZQ");

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"remove","entry_key":"-Nabc"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Remove {
                entry_key: "-Nabc".to_string()
            }
        );
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"play_next"}"#).unwrap();
        assert_eq!(msg, ClientMessage::PlayNext);
    }

    #[test]
    fn test_unknown_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"teleport"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let json = serde_json::to_value(ServerMessage::Status {
            status: PlaybackStatus::Playing,
        })
        .unwrap();
        assert_eq!(json, json!({"type": "status", "status": "playing"}));

        let json = serde_json::to_value(ServerMessage::CurrentTrack { track: None }).unwrap();
        assert_eq!(json, json!({"type": "current_track", "track": null}));
    }

    #[test]
    fn test_from_session_event() {
        assert_eq!(
            ServerMessage::from(SessionEvent::Queue(vec![])),
            ServerMessage::Queue { entries: vec![] }
        );
        assert_eq!(
            ServerMessage::from(SessionEvent::Status(PlaybackStatus::Idle)),
            ServerMessage::Status {
                status: PlaybackStatus::Idle
            }
        );
    }
}
