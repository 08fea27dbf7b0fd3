//! Protocol error types.

use thiserror::Error;

/// An event failed validation at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A content or argument delta was empty.
    ///
    /// `TEXT_MESSAGE_CONTENT` and `TOOL_CALL_ARGS` deltas carry incremental
    /// payload; an empty delta is a protocol violation, not a no-op.
    #[error("{event} delta must not be empty")]
    EmptyDelta {
        /// Wire tag of the offending event kind.
        event: &'static str,
    },

    /// A state delta was not a valid RFC 6902 JSON Patch document.
    #[error("invalid JSON Patch document: {0}")]
    InvalidPatch(String),
}

/// A JSON Patch could not be applied to a state value.
#[derive(Debug, Error)]
pub enum PatchError {
    /// An operation referenced a nonexistent path or a `test` op failed.
    #[error("patch application failed: {0}")]
    Apply(#[from] json_patch::PatchError),
}
