//! The inbound runtime event contract.
//!
//! The adapter consumes a generic event feed owned by the agent runtime
//! collaborator. One [`RuntimeEvent`] may carry several payloads at once
//! (a text chunk and a state update, say); the translator processes them in
//! a fixed priority order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A function call requested by the runtime's model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
    /// Runtime-internal call identifier, used to correlate the result.
    pub id: String,
}

impl FunctionCall {
    /// Create a function call with a freshly minted runtime id.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            id: format!("fc_{}", Uuid::new_v4()),
        }
    }

    /// Use an explicit runtime call id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// The result of a function call executed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    /// Runtime call id this result responds to.
    pub call_id: String,
    /// JSON-encoded result payload.
    pub result: String,
    /// Whether the tool execution failed.
    #[serde(default)]
    pub is_error: bool,
}

impl FunctionResult {
    /// Create a successful result.
    pub fn new(call_id: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            result: result.into(),
            is_error: false,
        }
    }

    /// Mark the result as a tool failure.
    #[must_use]
    pub const fn with_error(mut self) -> Self {
        self.is_error = true;
        self
    }
}

/// One entry of the runtime's conversation history.
///
/// Roles use the runtime's own vocabulary (some runtimes say `model` for
/// assistant turns); the translator normalizes them to protocol roles when
/// building a `MESSAGES_SNAPSHOT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Runtime role tag.
    pub role: String,
    /// Text content.
    pub content: String,
}

impl HistoryMessage {
    /// Create a history entry.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// One event from the agent runtime's feed.
///
/// This shape is defined by the runtime collaborator; the adapter is a
/// consumer, not the owner, of this contract. All payload fields are
/// optional and independently present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    /// Invocation this event belongs to.
    pub invocation_id: String,
    /// Incremental model text.
    #[serde(default)]
    pub text_chunk: Option<String>,
    /// A tool invocation requested by the model.
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    /// A completed tool execution.
    #[serde(default)]
    pub function_result: Option<FunctionResult>,
    /// Updated application state (full value, not a patch).
    #[serde(default)]
    pub state_delta: Option<Value>,
    /// Whether `text_chunk` is a partial fragment of a larger message.
    #[serde(default)]
    pub is_partial: bool,
    /// Whether the current model turn is complete.
    #[serde(default)]
    pub turn_complete: bool,
    /// Error reported by the runtime; terminates the run.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Final event of the invocation; ends the feed.
    #[serde(default)]
    pub is_final: bool,
}

impl RuntimeEvent {
    /// Create an empty event for `invocation_id`.
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            ..Self::default()
        }
    }

    /// Create a text event.
    pub fn text(invocation_id: impl Into<String>, chunk: impl Into<String>) -> Self {
        Self {
            text_chunk: Some(chunk.into()),
            ..Self::new(invocation_id)
        }
    }

    /// Create a function-call event.
    pub fn call(invocation_id: impl Into<String>, call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Self::new(invocation_id)
        }
    }

    /// Create a function-result event.
    pub fn result(invocation_id: impl Into<String>, result: FunctionResult) -> Self {
        Self {
            function_result: Some(result),
            ..Self::new(invocation_id)
        }
    }

    /// Create a state-update event.
    pub fn state(invocation_id: impl Into<String>, state: Value) -> Self {
        Self {
            state_delta: Some(state),
            ..Self::new(invocation_id)
        }
    }

    /// Create a runtime-error event.
    pub fn error(invocation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::new(invocation_id)
        }
    }

    /// Create the final marker event for an invocation.
    pub fn final_marker(invocation_id: impl Into<String>) -> Self {
        Self {
            is_final: true,
            ..Self::new(invocation_id)
        }
    }

    /// Mark the text chunk as a partial fragment.
    #[must_use]
    pub const fn partial(mut self) -> Self {
        self.is_partial = true;
        self
    }

    /// Mark the model turn as complete.
    #[must_use]
    pub const fn complete_turn(mut self) -> Self {
        self.turn_complete = true;
        self
    }

    /// Attach a state update to this event.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state_delta = Some(state);
        self
    }
}
