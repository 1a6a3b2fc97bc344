//! Error type shared by every engine entry point.
//!
//! Serialized as `{ "kind": "<variant>", "message": "<text>" }` so the
//! dashboard can match on a stable `kind` string.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum EngineError {
    /// A crop id that is not present in the catalog.
    #[error("crop '{0}' not found in catalog")]
    NotFound(String),

    /// Reference data or settings that cannot produce meaningful state.
    /// Only raised during construction; callers treat it as fatal.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Water purge was requested while autonomous control is running.
    #[error("purge is only available while the system is paused")]
    PurgeUnavailable,
}
