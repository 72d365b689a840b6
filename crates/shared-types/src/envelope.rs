//! # `AuthenticatedCall` Envelope
//!
//! Wrapper for every request that reaches the custody core from a host.
//!
//! ## Properties
//!
//! - **Envelope Authority**: `caller` is the sole source of truth for who is
//!   acting. Payloads MUST NOT carry their own caller field.
//! - **Correlation**: responses echo `correlation_id`.
//! - **Versioning**: `version` is checked before the payload is interpreted.
//!
//! The envelope does not prove anything about `caller`; the host
//! authenticates the party before building it.

use crate::entities::PartyId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request payload together with the authenticated identity invoking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedCall<T> {
    /// Envelope format version.
    #[serde(default = "default_version")]
    pub version: u16,

    /// Correlates this call with its response.
    #[serde(default = "Uuid::new_v4")]
    pub correlation_id: Uuid,

    /// Identity on whose behalf the payload is executed.
    /// `None` is only acceptable for read-only calls.
    #[serde(default)]
    pub caller: Option<PartyId>,

    /// The request itself.
    pub payload: T,
}

fn default_version() -> u16 {
    AuthenticatedCall::<()>::CURRENT_VERSION
}

impl<T> AuthenticatedCall<T> {
    /// Current envelope version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Build an envelope for `caller` with a fresh correlation id.
    pub fn new(caller: PartyId, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: Uuid::new_v4(),
            caller: Some(caller),
            payload,
        }
    }

    /// Build an envelope without a caller (read-only queries).
    pub fn anonymous(payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: Uuid::new_v4(),
            caller: None,
            payload,
        }
    }

    /// True if this envelope's version can be processed.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}
