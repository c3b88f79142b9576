//! Slash-separated paths into the store tree.

use std::fmt;

use crate::traits::StoreError;

/// Root under which every session lives.
pub const SESSIONS_ROOT: &str = "sessions";

/// Child key of the queue subtree.
pub const QUEUE: &str = "queue";
/// Child key of the current track.
pub const CURRENT_TRACK: &str = "currentTrack";
/// Child key of the playback status.
pub const STATUS: &str = "status";
/// Child key of the driver info record.
pub const DRIVER_INFO: &str = "driverInfo";
/// Child key of the last mutation timestamp.
pub const LAST_UPDATE: &str = "lastUpdate";

/// A validated path into the store. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The tree root.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a slash-separated path. Leading, trailing and doubled slashes are ignored.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if a segment contains a forbidden character.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let mut path = Self::root();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// Append one segment.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if the segment is empty or contains
    /// `/`, `.`, `#`, `$`, `[` or `]`.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Append a relative, possibly multi-segment, path.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if any segment is invalid.
    pub fn join(&self, relative: &str) -> Result<Self, StoreError> {
        let mut path = self.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// `sessions/{sessionId}`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if the session id is not a valid key.
    pub fn session(session_id: &str) -> Result<Self, StoreError> {
        Self::root().child(SESSIONS_ROOT)?.child(session_id)
    }

    /// `sessions/{sessionId}/queue`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if the session id is not a valid key.
    pub fn queue(session_id: &str) -> Result<Self, StoreError> {
        Self::session(session_id)?.child(QUEUE)
    }

    /// `sessions/{sessionId}/queue/{entryKey}`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if either key is not valid.
    pub fn queue_entry(session_id: &str, entry_key: &str) -> Result<Self, StoreError> {
        Self::queue(session_id)?.child(entry_key)
    }

    /// `sessions/{sessionId}/currentTrack`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if the session id is not a valid key.
    pub fn current_track(session_id: &str) -> Result<Self, StoreError> {
        Self::session(session_id)?.child(CURRENT_TRACK)
    }

    /// `sessions/{sessionId}/status`.
    ///
    /// # Errors
    /// Returns `StoreError::InvalidPath` if the session id is not a valid key.
    pub fn status(session_id: &str) -> Result<Self, StoreError> {
        Self::session(session_id)?.child(STATUS)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path; the root has none.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// True if `self` equals `other` or lies above it.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True if a change at one path can affect the value at the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    const FORBIDDEN: [char; 6] = ['/', '.', '#', '$', '[', ']'];
    if segment.is_empty() || segment.contains(FORBIDDEN) || segment.chars().any(char::is_control) {
        return Err(StoreError::InvalidPath(segment.to_string()));
    }
    Ok(())
}
