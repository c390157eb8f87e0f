//! Error types for the resource / plugin / renderer core.
//!
//! Path errors come from `prism-value` and are wrapped unchanged, so callers
//! can still match on `PathError::Syntax`, `PathError::Type` and
//! `PathError::NotFound`.

use prism_value::PathError;
use thiserror::Error;

use crate::resource::ResourceKind;

/// The main error type of the engine core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Path parsing or resolution failed; the payload was not modified.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A payload does not have the shape its resource kind requires.
    #[error("invalid {kind} payload: {reason}")]
    ResourceShape {
        kind: ResourceKind,
        reason: String,
    },

    /// Bound resources do not satisfy the plugin's declared schema.
    ///
    /// Only the current draw is aborted; the renderer stays usable.
    #[error("schema mismatch for plugin `{plugin}` at {location}: {reason}")]
    SchemaMismatch {
        plugin: String,
        location: String,
        reason: String,
    },

    /// The output context was invalidated; cached GPU objects are gone.
    #[error("rendering context lost")]
    ContextLost,

    /// The GPU backend failed to carry out a request.
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    pub(crate) fn shape(kind: ResourceKind, reason: impl Into<String>) -> Self {
        Error::ResourceShape {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(
        plugin: &str,
        location: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::SchemaMismatch {
            plugin: plugin.to_string(),
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
