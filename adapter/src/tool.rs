//! Tool call framing and correlation.

use agio_core::Event;
use indexmap::IndexMap;
use tracing::warn;
use uuid::Uuid;

use crate::error::AdapterError;

/// An in-flight tool call.
#[derive(Debug)]
pub struct OpenToolCall {
    /// Protocol tool call id (minted fresh per call).
    pub tool_call_id: String,
    /// Tool name.
    pub name: String,
    /// Message the call was issued from, when known.
    pub parent_message_id: Option<String>,
    args: String,
}

impl OpenToolCall {
    /// Argument text accumulated so far.
    #[must_use]
    pub fn args(&self) -> &str {
        &self.args
    }
}

/// Tracks open tool calls for one run.
///
/// Keyed by the runtime's internal function-call id so that an asynchronous
/// tool result — which only carries the runtime id — can be correlated back
/// to the protocol `tool_call_id` and closed exactly once. The mapping is a
/// back-reference; the registry never owns the runtime object.
#[derive(Debug, Default)]
pub struct ToolCallRegistry {
    open: IndexMap<String, OpenToolCall>,
}

impl ToolCallRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open calls.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Look up an open call by its runtime id.
    #[must_use]
    pub fn get(&self, runtime_call_id: &str) -> Option<&OpenToolCall> {
        self.open.get(runtime_call_id)
    }

    /// Open a tool call, emitting `TOOL_CALL_START` with a freshly minted
    /// protocol id.
    ///
    /// A second start for a runtime id that is still open closes the stale
    /// call first — `END` always precedes the next `START` reusing an id
    /// slot, whatever the runtime does.
    pub fn start(
        &mut self,
        runtime_call_id: impl Into<String>,
        name: impl Into<String>,
        parent_message_id: Option<String>,
    ) -> Vec<Event> {
        let runtime_call_id = runtime_call_id.into();
        let mut events = Vec::with_capacity(2);
        if let Some(stale) = self.open.shift_remove(&runtime_call_id) {
            warn!(
                call_id = %runtime_call_id,
                "runtime reused an open function-call id; closing the stale tool call"
            );
            events.push(Event::tool_call_end(stale.tool_call_id));
        }

        let call = OpenToolCall {
            tool_call_id: format!("tc_{}", Uuid::new_v4()),
            name: name.into(),
            parent_message_id,
            args: String::new(),
        };
        events.push(Event::tool_call_start(
            &call.tool_call_id,
            &call.name,
            call.parent_message_id.clone(),
        ));
        self.open.insert(runtime_call_id, call);
        events
    }

    /// Append argument text to an open call by protocol id, emitting
    /// `TOOL_CALL_ARGS`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NoOpenToolCall`] when no call with that
    /// protocol id is open, or the validation error for an empty delta.
    pub fn args(&mut self, tool_call_id: &str, delta: &str) -> Result<Event, AdapterError> {
        let call = self
            .open
            .values_mut()
            .find(|call| call.tool_call_id == tool_call_id)
            .ok_or_else(|| AdapterError::NoOpenToolCall {
                tool_call_id: tool_call_id.to_string(),
            })?;
        let event = Event::tool_call_args(&call.tool_call_id, delta)?;
        call.args.push_str(delta);
        Ok(event)
    }

    /// Append argument text to an open call by runtime id.
    ///
    /// # Errors
    ///
    /// Same contract as [`ToolCallRegistry::args`].
    pub fn args_by_call_id(
        &mut self,
        runtime_call_id: &str,
        delta: &str,
    ) -> Result<Event, AdapterError> {
        let call = self.open.get_mut(runtime_call_id).ok_or_else(|| {
            AdapterError::NoOpenToolCall {
                tool_call_id: runtime_call_id.to_string(),
            }
        })?;
        let event = Event::tool_call_args(&call.tool_call_id, delta)?;
        call.args.push_str(delta);
        Ok(event)
    }

    /// Close the call correlated to a runtime id, emitting `TOOL_CALL_END`.
    ///
    /// Returns `None` for an unmatched id: a tool result with no open call
    /// is a recoverable anomaly for the caller to report, never a run
    /// failure. Closing is idempotent per id.
    pub fn end_by_call_id(&mut self, runtime_call_id: &str) -> Option<Event> {
        self.open
            .shift_remove(runtime_call_id)
            .map(|call| Event::tool_call_end(call.tool_call_id))
    }

    /// Close every open call in insertion order.
    ///
    /// Used on error paths so no `TOOL_CALL_START` is left unterminated.
    pub fn close_all(&mut self) -> Vec<Event> {
        self.open
            .drain(..)
            .map(|(_, call)| Event::tool_call_end(call.tool_call_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_args_end_share_one_protocol_id() {
        let mut tools = ToolCallRegistry::new();
        let events = tools.start("fc_1", "get_weather", None);
        assert_eq!(events.len(), 1);

        let tool_call_id = tools.get("fc_1").unwrap().tool_call_id.clone();
        let args = tools
            .args_by_call_id("fc_1", r#"{"location":"Paris"}"#)
            .unwrap();
        assert_eq!(tools.get("fc_1").unwrap().args(), r#"{"location":"Paris"}"#);
        let end = tools.end_by_call_id("fc_1").unwrap();

        for event in [&events[0], &args, &end] {
            let value = serde_json::to_value(event).unwrap();
            assert_eq!(value["toolCallId"], tool_call_id.as_str());
        }
    }

    #[test]
    fn protocol_ids_are_minted_fresh() {
        let mut tools = ToolCallRegistry::new();
        tools.start("fc_1", "order_food", None);
        let id = &tools.get("fc_1").unwrap().tool_call_id;
        assert_ne!(id, "fc_1");
        assert!(id.starts_with("tc_"));
    }

    #[test]
    fn unmatched_result_is_none() {
        let mut tools = ToolCallRegistry::new();
        assert!(tools.end_by_call_id("fc_unknown").is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let mut tools = ToolCallRegistry::new();
        tools.start("fc_1", "get_weather", None);
        assert!(tools.end_by_call_id("fc_1").is_some());
        assert!(tools.end_by_call_id("fc_1").is_none());
    }

    #[test]
    fn args_require_an_open_call() {
        let mut tools = ToolCallRegistry::new();
        assert!(matches!(
            tools.args("tc_missing", "{}"),
            Err(AdapterError::NoOpenToolCall { .. })
        ));
    }

    #[test]
    fn empty_args_delta_is_rejected() {
        let mut tools = ToolCallRegistry::new();
        tools.start("fc_1", "get_weather", None);
        assert!(matches!(
            tools.args_by_call_id("fc_1", ""),
            Err(AdapterError::Event(_))
        ));
    }

    #[test]
    fn reused_runtime_id_closes_stale_call_first() {
        let mut tools = ToolCallRegistry::new();
        tools.start("fc_1", "get_weather", None);
        let stale_id = tools.get("fc_1").unwrap().tool_call_id.clone();

        let events = tools.start("fc_1", "get_weather", None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "TOOL_CALL_END");
        assert_eq!(
            serde_json::to_value(&events[0]).unwrap()["toolCallId"],
            stale_id.as_str()
        );
        assert_eq!(events[1].event_type(), "TOOL_CALL_START");
    }

    #[test]
    fn close_all_drains_in_insertion_order() {
        let mut tools = ToolCallRegistry::new();
        tools.start("fc_1", "order_food", None);
        tools.start("fc_2", "order_drink", None);
        let first_id = tools.get("fc_1").unwrap().tool_call_id.clone();

        let events = tools.close_all();
        assert_eq!(events.len(), 2);
        assert_eq!(
            serde_json::to_value(&events[0]).unwrap()["toolCallId"],
            first_id.as_str()
        );
        assert_eq!(tools.open_count(), 0);
    }
}
