//! Client identity attached to queue writes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder identity used when a client has no anonymous uid.
pub const UNIDENTIFIED: &str = "anonymous";

/// Identity of the client issuing protocol operations.
///
/// Identities are opaque tags written into `addedBy`; nothing
/// authenticates or authorizes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    /// Opaque identity string.
    pub identity: String,
}

impl ClientContext {
    /// Context with an explicit identity.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }

    /// Fresh anonymous identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    /// Client without any identity.
    #[must_use]
    pub fn unidentified() -> Self {
        Self::new(UNIDENTIFIED)
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        Self::unidentified()
    }
}
