//! Adapter error types.

use agio_core::{EventError, PatchError};
use thiserror::Error;

use crate::run::RunPhase;

/// Wire error codes attached to `RUN_ERROR` events.
pub mod codes {
    /// The runtime collaborator reported an error.
    pub const RUNTIME_ERROR: &str = "RUNTIME_ERROR";
    /// The adapter's own driving logic violated a state-machine contract.
    pub const ADAPTER_PROTOCOL_VIOLATION: &str = "ADAPTER_PROTOCOL_VIOLATION";
    /// An internal adapter failure unrelated to protocol state.
    pub const ADAPTER_INTERNAL_ERROR: &str = "ADAPTER_INTERNAL_ERROR";
    /// A state patch was malformed or could not be applied.
    pub const STATE_PATCH_ERROR: &str = "STATE_PATCH_ERROR";
    /// The run was cancelled from outside.
    pub const CANCELLED: &str = "CANCELLED";
}

/// Errors raised while driving the protocol state machines.
///
/// The state-transition variants are programming errors in the adapter's
/// driving logic, not protocol-level conditions; the translator converts
/// them into a terminal `RUN_ERROR` instead of letting them escape as
/// panics or unterminated streams.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// A run with this invocation id was already started.
    #[error("run {run_id} already started; a run cannot restart")]
    DuplicateRun {
        /// The offending run id.
        run_id: String,
    },

    /// An operation required an active run.
    #[error("operation requires an active run (current phase: {phase:?})")]
    InvalidRunState {
        /// The phase the run was actually in.
        phase: RunPhase,
    },

    /// A second text message was opened while one is still streaming.
    #[error("text message {message_id} is already open")]
    MessageAlreadyOpen {
        /// Id of the message that is currently open.
        message_id: String,
    },

    /// A content delta arrived with no open text message.
    #[error("no open text message")]
    NoOpenMessage,

    /// An argument delta referenced a tool call that is not open.
    #[error("no open tool call {tool_call_id}")]
    NoOpenToolCall {
        /// The unmatched tool call id.
        tool_call_id: String,
    },

    /// Event construction failed validation.
    #[error(transparent)]
    Event(#[from] EventError),

    /// A state patch failed to apply.
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// The outbound event channel was closed by the consumer.
    #[error("outbound event channel closed")]
    ChannelClosed,
}

impl AdapterError {
    /// The wire error code used when this error terminates a run.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Event(EventError::InvalidPatch(_)) | Self::Patch(_) => codes::STATE_PATCH_ERROR,
            Self::ChannelClosed => codes::ADAPTER_INTERNAL_ERROR,
            _ => codes::ADAPTER_PROTOCOL_VIOLATION,
        }
    }
}
