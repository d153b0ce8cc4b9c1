//! Error taxonomy for the editing engine.
//!
//! Every variant is recoverable at the action boundary: the caller reports a
//! short message and the document stays consistent.

use crate::config::ConfigError;
use crate::editor::BusyState;
use crate::shapes::{ObjectId, ObjectKind};
use crate::storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the scene model, the dispatcher and the sync bridge.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mutation targeted an id that is not in the document.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The action needs a different kind of active object.
    #[error("{}", wrong_selection_message(.expected, .found))]
    WrongSelectionType {
        expected: &'static str,
        found: Option<ObjectKind>,
    },

    /// Raw snapshot text failed structural validation.
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A known action received a missing or ill-typed payload.
    #[error("invalid payload for '{action}': {reason}")]
    InvalidPayload { action: &'static str, reason: String },

    /// An attribute patch does not fit the object's kind.
    #[error("invalid attribute for {id}: {reason}")]
    InvalidAttribute { id: ObjectId, reason: String },

    /// A structural mutation was attempted while a load, save or asset request is in flight.
    #[error("editor is busy ({0})")]
    Busy(BusyState),

    /// The template store could not be reached or refused the request.
    #[error("template store unavailable: {0}")]
    StoreUnavailable(String),

    /// The operation needs a signed-in user.
    #[error("sign in required")]
    AuthRequired,

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    /// An image asset could not be fetched or decoded.
    #[error("image unavailable: {0}")]
    AssetUnavailable(String),

    /// A completion arrived for a request the editor is not waiting on.
    #[error("no pending request {0}")]
    UnknownRequest(u64),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn wrong_selection_message(expected: &str, found: &Option<ObjectKind>) -> String {
    match found {
        Some(kind) => format!("select a {expected} (the active object is a {kind})"),
        None => format!("select a {expected}"),
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::TemplateNotFound(id),
            StoreError::AuthRequired => EngineError::AuthRequired,
            other => EngineError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;
