//! AG-UI protocol events.
//!
//! The closed set of event variants streamed from an agent run to a UI
//! client. Events are immutable value objects: the `type` discriminant is
//! fixed per variant and all validation happens in the factory constructors,
//! so a constructed event is always well-formed on the wire.

use std::time::{SystemTime, UNIX_EPOCH};

use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;
use crate::types::{Message, Role};

/// Common fields carried by every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseEvent {
    /// Event timestamp in milliseconds since epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Raw source payload from the originating runtime, for debugging.
    #[serde(rename = "rawEvent", skip_serializing_if = "Option::is_none")]
    pub raw_event: Option<Value>,
}

/// One AG-UI protocol event.
///
/// Serialized with a `SCREAMING_SNAKE_CASE` `type` tag and camelCase fields,
/// per the AG-UI wire format. See <https://docs.ag-ui.com/concepts/events>.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------
    /// An agent run has started.
    #[serde(rename = "RUN_STARTED")]
    RunStarted {
        /// Conversation thread this run belongs to.
        #[serde(rename = "threadId")]
        thread_id: String,
        /// Unique run identifier.
        #[serde(rename = "runId")]
        run_id: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// An agent run completed successfully.
    #[serde(rename = "RUN_FINISHED")]
    RunFinished {
        #[serde(rename = "threadId")]
        thread_id: String,
        #[serde(rename = "runId")]
        run_id: String,
        /// Optional final result payload.
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// An agent run terminated with an error.
    #[serde(rename = "RUN_ERROR")]
    RunError {
        /// Human-readable error description.
        message: String,
        /// Machine-readable error code.
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// A named step within a run has started.
    #[serde(rename = "STEP_STARTED")]
    StepStarted {
        #[serde(rename = "stepName")]
        step_name: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// A named step within a run has finished.
    #[serde(rename = "STEP_FINISHED")]
    StepFinished {
        #[serde(rename = "stepName")]
        step_name: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    // ------------------------------------------------------------------
    // Text messages
    // ------------------------------------------------------------------
    /// Beginning of a streamed assistant message.
    #[serde(rename = "TEXT_MESSAGE_START")]
    TextMessageStart {
        #[serde(rename = "messageId")]
        message_id: String,
        /// Always [`Role::Assistant`] for streamed messages.
        role: Role,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Incremental text content for an open message.
    #[serde(rename = "TEXT_MESSAGE_CONTENT")]
    TextMessageContent {
        #[serde(rename = "messageId")]
        message_id: String,
        /// Non-empty text fragment.
        delta: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// End of a streamed message.
    #[serde(rename = "TEXT_MESSAGE_END")]
    TextMessageEnd {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Self-describing text fragment, usable without a prior start event.
    #[serde(rename = "TEXT_MESSAGE_CHUNK")]
    TextMessageChunk {
        #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<String>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    // ------------------------------------------------------------------
    // Tool calls
    // ------------------------------------------------------------------
    /// An agent-initiated tool call has started.
    #[serde(rename = "TOOL_CALL_START")]
    ToolCallStart {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolCallName")]
        tool_call_name: String,
        /// Message the call was issued from, when known.
        #[serde(rename = "parentMessageId", skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Incremental tool-call argument text.
    #[serde(rename = "TOOL_CALL_ARGS")]
    ToolCallArgs {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        /// Non-empty argument fragment (JSON text).
        delta: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Tool-call argument streaming is complete.
    #[serde(rename = "TOOL_CALL_END")]
    ToolCallEnd {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Self-describing tool-call fragment, usable without a prior start.
    #[serde(rename = "TOOL_CALL_CHUNK")]
    ToolCallChunk {
        #[serde(rename = "toolCallId", skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(rename = "toolCallName", skip_serializing_if = "Option::is_none")]
        tool_call_name: Option<String>,
        #[serde(rename = "parentMessageId", skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delta: Option<String>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------
    /// Full replacement of the tracked application state.
    #[serde(rename = "STATE_SNAPSHOT")]
    StateSnapshot {
        /// Complete state value.
        snapshot: Value,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Incremental state change relative to the last known state.
    #[serde(rename = "STATE_DELTA")]
    StateDelta {
        /// RFC 6902 JSON Patch operations.
        delta: Patch,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Full replacement of the conversation history.
    #[serde(rename = "MESSAGES_SNAPSHOT")]
    MessagesSnapshot {
        /// Complete ordered history.
        messages: Vec<Message>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    // ------------------------------------------------------------------
    // Passthrough
    // ------------------------------------------------------------------
    /// An event from an external system, forwarded verbatim.
    #[serde(rename = "RAW")]
    Raw {
        /// The external event payload.
        event: Value,
        /// Originating system, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// Application-defined event.
    #[serde(rename = "CUSTOM")]
    Custom {
        /// Application-chosen event name.
        name: String,
        /// Arbitrary payload.
        value: Value,
        #[serde(flatten)]
        base: BaseEvent,
    },
}

impl Event {
    /// Create a run-started event.
    pub fn run_started(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self::RunStarted {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            base: BaseEvent::default(),
        }
    }

    /// Create a run-finished event.
    pub fn run_finished(
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
        result: Option<Value>,
    ) -> Self {
        Self::RunFinished {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            result,
            base: BaseEvent::default(),
        }
    }

    /// Create a run-error event.
    pub fn run_error(message: impl Into<String>, code: Option<String>) -> Self {
        Self::RunError {
            message: message.into(),
            code,
            base: BaseEvent::default(),
        }
    }

    /// Create a step-started event.
    pub fn step_started(step_name: impl Into<String>) -> Self {
        Self::StepStarted {
            step_name: step_name.into(),
            base: BaseEvent::default(),
        }
    }

    /// Create a step-finished event.
    pub fn step_finished(step_name: impl Into<String>) -> Self {
        Self::StepFinished {
            step_name: step_name.into(),
            base: BaseEvent::default(),
        }
    }

    /// Create a text-message-start event. The role is always `assistant`.
    pub fn text_message_start(message_id: impl Into<String>) -> Self {
        Self::TextMessageStart {
            message_id: message_id.into(),
            role: Role::Assistant,
            base: BaseEvent::default(),
        }
    }

    /// Create a text-message-content event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyDelta`] when `delta` is empty.
    pub fn text_message_content(
        message_id: impl Into<String>,
        delta: impl Into<String>,
    ) -> Result<Self, EventError> {
        let delta = delta.into();
        if delta.is_empty() {
            return Err(EventError::EmptyDelta {
                event: "TEXT_MESSAGE_CONTENT",
            });
        }
        Ok(Self::TextMessageContent {
            message_id: message_id.into(),
            delta,
            base: BaseEvent::default(),
        })
    }

    /// Create a text-message-end event.
    pub fn text_message_end(message_id: impl Into<String>) -> Self {
        Self::TextMessageEnd {
            message_id: message_id.into(),
            base: BaseEvent::default(),
        }
    }

    /// Create a self-describing text-message-chunk event.
    pub fn text_message_chunk(
        message_id: Option<String>,
        role: Option<Role>,
        delta: Option<String>,
    ) -> Self {
        Self::TextMessageChunk {
            message_id,
            role,
            delta,
            base: BaseEvent::default(),
        }
    }

    /// Create a tool-call-start event.
    pub fn tool_call_start(
        tool_call_id: impl Into<String>,
        tool_call_name: impl Into<String>,
        parent_message_id: Option<String>,
    ) -> Self {
        Self::ToolCallStart {
            tool_call_id: tool_call_id.into(),
            tool_call_name: tool_call_name.into(),
            parent_message_id,
            base: BaseEvent::default(),
        }
    }

    /// Create a tool-call-args event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EmptyDelta`] when `delta` is empty.
    pub fn tool_call_args(
        tool_call_id: impl Into<String>,
        delta: impl Into<String>,
    ) -> Result<Self, EventError> {
        let delta = delta.into();
        if delta.is_empty() {
            return Err(EventError::EmptyDelta {
                event: "TOOL_CALL_ARGS",
            });
        }
        Ok(Self::ToolCallArgs {
            tool_call_id: tool_call_id.into(),
            delta,
            base: BaseEvent::default(),
        })
    }

    /// Create a tool-call-end event.
    pub fn tool_call_end(tool_call_id: impl Into<String>) -> Self {
        Self::ToolCallEnd {
            tool_call_id: tool_call_id.into(),
            base: BaseEvent::default(),
        }
    }

    /// Create a self-describing tool-call-chunk event.
    pub fn tool_call_chunk(
        tool_call_id: Option<String>,
        tool_call_name: Option<String>,
        parent_message_id: Option<String>,
        delta: Option<String>,
    ) -> Self {
        Self::ToolCallChunk {
            tool_call_id,
            tool_call_name,
            parent_message_id,
            delta,
            base: BaseEvent::default(),
        }
    }

    /// Create a state-snapshot event.
    pub fn state_snapshot(snapshot: Value) -> Self {
        Self::StateSnapshot {
            snapshot,
            base: BaseEvent::default(),
        }
    }

    /// Create a state-delta event from an already-typed patch.
    pub fn state_delta(delta: Patch) -> Self {
        Self::StateDelta {
            delta,
            base: BaseEvent::default(),
        }
    }

    /// Create a state-delta event from a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidPatch`] when the value is not a valid
    /// RFC 6902 operation array (unknown ops, missing fields, wrong shape).
    pub fn state_delta_from_value(delta: Value) -> Result<Self, EventError> {
        let patch: Patch = serde_json::from_value(delta)
            .map_err(|err| EventError::InvalidPatch(err.to_string()))?;
        Ok(Self::state_delta(patch))
    }

    /// Create a messages-snapshot event.
    pub fn messages_snapshot(messages: Vec<Message>) -> Self {
        Self::MessagesSnapshot {
            messages,
            base: BaseEvent::default(),
        }
    }

    /// Create a raw passthrough event.
    pub fn raw(event: Value, source: Option<String>) -> Self {
        Self::Raw {
            event,
            source,
            base: BaseEvent::default(),
        }
    }

    /// Create a custom application event.
    pub fn custom(name: impl Into<String>, value: Value) -> Self {
        Self::Custom {
            name: name.into(),
            value,
            base: BaseEvent::default(),
        }
    }

    /// The wire tag of this event.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "RUN_STARTED",
            Self::RunFinished { .. } => "RUN_FINISHED",
            Self::RunError { .. } => "RUN_ERROR",
            Self::StepStarted { .. } => "STEP_STARTED",
            Self::StepFinished { .. } => "STEP_FINISHED",
            Self::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Self::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Self::TextMessageChunk { .. } => "TEXT_MESSAGE_CHUNK",
            Self::ToolCallStart { .. } => "TOOL_CALL_START",
            Self::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            Self::ToolCallEnd { .. } => "TOOL_CALL_END",
            Self::ToolCallChunk { .. } => "TOOL_CALL_CHUNK",
            Self::StateSnapshot { .. } => "STATE_SNAPSHOT",
            Self::StateDelta { .. } => "STATE_DELTA",
            Self::MessagesSnapshot { .. } => "MESSAGES_SNAPSHOT",
            Self::Raw { .. } => "RAW",
            Self::Custom { .. } => "CUSTOM",
        }
    }

    /// Whether this event terminates a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. } | Self::RunError { .. })
    }

    /// Set the timestamp on this event.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.base_mut().timestamp = Some(timestamp);
        self
    }

    /// Attach the raw source payload this event was derived from.
    #[must_use]
    pub fn with_raw_event(mut self, raw: Value) -> Self {
        self.base_mut().raw_event = Some(raw);
        self
    }

    /// Current wall-clock time in milliseconds since epoch.
    #[must_use]
    pub fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }

    fn base_mut(&mut self) -> &mut BaseEvent {
        match self {
            Self::RunStarted { base, .. }
            | Self::RunFinished { base, .. }
            | Self::RunError { base, .. }
            | Self::StepStarted { base, .. }
            | Self::StepFinished { base, .. }
            | Self::TextMessageStart { base, .. }
            | Self::TextMessageContent { base, .. }
            | Self::TextMessageEnd { base, .. }
            | Self::TextMessageChunk { base, .. }
            | Self::ToolCallStart { base, .. }
            | Self::ToolCallArgs { base, .. }
            | Self::ToolCallEnd { base, .. }
            | Self::ToolCallChunk { base, .. }
            | Self::StateSnapshot { base, .. }
            | Self::StateDelta { base, .. }
            | Self::MessagesSnapshot { base, .. }
            | Self::Raw { base, .. }
            | Self::Custom { base, .. } => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_started_wire_shape() {
        let event = Event::run_started("t1", "run_1").with_timestamp(1234);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "RUN_STARTED",
                "threadId": "t1",
                "runId": "run_1",
                "timestamp": 1234,
            })
        );
    }

    #[test]
    fn optional_fields_are_omitted() {
        let value = serde_json::to_value(Event::run_error("boom", None)).unwrap();
        assert_eq!(value, json!({"type": "RUN_ERROR", "message": "boom"}));

        let value = serde_json::to_value(Event::run_error(
            "boom",
            Some("RUNTIME_ERROR".to_string()),
        ))
        .unwrap();
        assert_eq!(value["code"], "RUNTIME_ERROR");
    }

    #[test]
    fn text_message_start_role_is_assistant() {
        let value = serde_json::to_value(Event::text_message_start("msg_1")).unwrap();
        assert_eq!(value["type"], "TEXT_MESSAGE_START");
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn empty_content_delta_is_rejected() {
        let err = Event::text_message_content("msg_1", "").unwrap_err();
        assert_eq!(
            err,
            EventError::EmptyDelta {
                event: "TEXT_MESSAGE_CONTENT"
            }
        );
    }

    #[test]
    fn empty_args_delta_is_rejected() {
        let err = Event::tool_call_args("tc_1", "").unwrap_err();
        assert_eq!(
            err,
            EventError::EmptyDelta {
                event: "TOOL_CALL_ARGS"
            }
        );
    }

    #[test]
    fn tool_call_start_wire_shape() {
        let event = Event::tool_call_start("tc_1", "get_weather", Some("msg_1".to_string()));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "TOOL_CALL_START");
        assert_eq!(value["toolCallId"], "tc_1");
        assert_eq!(value["toolCallName"], "get_weather");
        assert_eq!(value["parentMessageId"], "msg_1");
    }

    #[test]
    fn state_delta_accepts_valid_patch() {
        let event = Event::state_delta_from_value(json!([
            {"op": "replace", "path": "/status", "value": "done"}
        ]))
        .unwrap();
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "STATE_DELTA");
        assert_eq!(value["delta"][0]["op"], "replace");
    }

    #[test]
    fn state_delta_rejects_unknown_op() {
        let err = Event::state_delta_from_value(json!([
            {"op": "teleport", "path": "/status", "value": "done"}
        ]))
        .unwrap_err();
        assert!(matches!(err, EventError::InvalidPatch(_)));
    }

    #[test]
    fn state_delta_rejects_non_array() {
        let err = Event::state_delta_from_value(json!({"op": "replace"})).unwrap_err();
        assert!(matches!(err, EventError::InvalidPatch(_)));
    }

    #[test]
    fn chunk_omits_absent_fields() {
        let value = serde_json::to_value(Event::text_message_chunk(
            None,
            None,
            Some("hi".to_string()),
        ))
        .unwrap();
        assert_eq!(value, json!({"type": "TEXT_MESSAGE_CHUNK", "delta": "hi"}));
    }

    #[test]
    fn events_round_trip_through_serde() {
        let events = vec![
            Event::run_started("t1", "r1"),
            Event::step_started("step_1"),
            Event::text_message_content("m1", "hello").unwrap(),
            Event::tool_call_start("tc_1", "order_food", None),
            Event::state_snapshot(json!({"steps": []})),
            Event::messages_snapshot(vec![Message::user("m1", "hi")]),
            Event::raw(json!({"kind": "ping"}), Some("runtime".to_string())),
            Event::custom("tick", json!(1)),
            Event::step_finished("step_1"),
            Event::run_finished("t1", "r1", Some(json!({"ok": true}))),
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            let back: Event = serde_json::from_value(value).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn raw_event_payload_is_attached() {
        let event = Event::text_message_end("m1").with_raw_event(json!({"src": "runtime"}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["rawEvent"]["src"], "runtime");
    }

    #[test]
    fn event_type_matches_wire_tag() {
        let event = Event::tool_call_end("tc_1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.event_type());
    }
}
