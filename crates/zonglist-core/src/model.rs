//! Wire data model for a driver session.
//!
//! Field names follow the store layout shared with the mobile and web
//! clients, so everything is camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// Descriptive fields of a playable video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Video identifier understood by the player.
    pub video_id: String,
    /// Display title.
    pub title: String,
    /// Display artist (channel name for video sources).
    pub artist: String,
    /// Thumbnail URL.
    pub thumbnail: String,
    /// Display duration, e.g. `4:33`.
    pub duration: String,
}

/// A passenger-requested track awaiting playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Store-assigned key. The map key in the queue subtree is authoritative.
    #[serde(rename = "id", default)]
    pub entry_key: String,
    #[serde(flatten)]
    pub info: TrackInfo,
    /// Client clock at enqueue time; the sole ordering key.
    pub added_at: Millis,
    /// Opaque identity of the requester.
    #[serde(default)]
    pub added_by: String,
}

/// The currently playing track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(flatten)]
    pub info: TrackInfo,
    /// When playback began.
    pub started_at: Millis,
}

impl Track {
    /// Project descriptive fields into a playing track.
    #[must_use]
    pub const fn new(info: TrackInfo, started_at: Millis) -> Self {
        Self { info, started_at }
    }
}

/// Playback status of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Nothing is playing.
    #[default]
    Idle,
    /// A current track is set.
    Playing,
}

impl PlaybackStatus {
    /// Status implied by the presence of a current track.
    #[must_use]
    pub const fn for_track(track: Option<&Track>) -> Self {
        if track.is_some() { Self::Playing } else { Self::Idle }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
        }
    }
}

/// Informational record about the driver and vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriverInfo {
    pub car_model: String,
    pub driver_name: String,
    pub is_active: bool,
    /// Any additional fields supplied by the driver app.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DriverInfo {
    fn default() -> Self {
        Self {
            car_model: "Tesla Model Y".to_string(),
            driver_name: "Driver".to_string(),
            is_active: true,
            extra: Map::new(),
        }
    }
}

impl DriverInfo {
    /// Driver info with a name and car model, active.
    #[must_use]
    pub fn new(driver_name: impl Into<String>, car_model: impl Into<String>) -> Self {
        Self {
            car_model: car_model.into(),
            driver_name: driver_name.into(),
            ..Self::default()
        }
    }
}

/// Full session record stored at `sessions/{sessionId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub queue: BTreeMap<String, QueueEntry>,
    #[serde(default)]
    pub current_track: Option<Track>,
    #[serde(default)]
    pub status: PlaybackStatus,
    #[serde(default)]
    pub driver_info: DriverInfo,
    #[serde(default)]
    pub last_update: Millis,
}

impl Session {
    /// A freshly started session: empty queue, nothing playing.
    #[must_use]
    pub fn fresh(driver_info: DriverInfo, now: Millis) -> Self {
        Self {
            queue: BTreeMap::new(),
            current_track: None,
            status: PlaybackStatus::Idle,
            driver_info,
            last_update: now,
        }
    }

    /// Queue entries in playback order.
    #[must_use]
    pub fn ordered_queue(&self) -> Vec<QueueEntry> {
        order_queue(self.queue.clone())
    }
}

/// Order a queue mapping by `(addedAt, entryKey)`.
///
/// The map key overrides whatever `id` the entry carries.
#[must_use]
pub fn order_queue(queue: impl IntoIterator<Item = (String, QueueEntry)>) -> Vec<QueueEntry> {
    let mut entries: Vec<QueueEntry> = queue
        .into_iter()
        .map(|(key, mut entry)| {
            entry.entry_key = key;
            entry
        })
        .collect();
    entries.sort_by(|a, b| {
        a.added_at
            .cmp(&b.added_at)
            .then_with(|| a.entry_key.cmp(&b.entry_key))
    });
    entries
}

/// Decode a raw queue subtree (absent decodes as empty).
///
/// # Errors
/// Returns error if an entry does not match the `QueueEntry` layout.
pub fn decode_queue(value: Value) -> Result<Vec<QueueEntry>, serde_json::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let map: BTreeMap<String, QueueEntry> = serde_json::from_value(value)?;
    Ok(order_queue(map))
}
