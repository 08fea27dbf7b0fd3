//! Runtime-event to protocol-event translation.

use agio_core::{Event, Message, Role, StateSynchronizer};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AdapterError, codes};
use crate::feed::{HistoryMessage, RuntimeEvent};
use crate::message::TextMessageState;
use crate::run::RunState;
use crate::tool::ToolCallRegistry;

/// Translates one invocation's runtime event feed into well-formed protocol
/// events.
///
/// Owns exactly one run state machine, at most one open text message, the
/// set of open tool calls, and the state synchronizer — all scoped to a
/// single invocation and driven from a single consumption loop.
///
/// Whatever order the runtime emits events in, the output sequence
/// satisfies: `RUN_STARTED` first, exactly one terminal event
/// (`RUN_FINISHED` or `RUN_ERROR`) last, and every `START` precedes its
/// `CONTENT`/`ARGS` and `END` for the same id. All fatal conditions funnel
/// through a single terminate path, so there is never a second terminal
/// event and never none.
#[derive(Debug)]
pub struct Translator {
    run: RunState,
    message: TextMessageState,
    tools: ToolCallRegistry,
    state: StateSynchronizer,
}

impl Translator {
    /// Create a translator for one invocation.
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            run: RunState::new(thread_id, run_id),
            message: TextMessageState::new(),
            tools: ToolCallRegistry::new(),
            state: StateSynchronizer::new(),
        }
    }

    /// The run identifier this translator is bound to.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run.run_id()
    }

    /// Whether the run has emitted its terminal event.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.run.is_terminal()
    }

    /// Start the run, emitting `RUN_STARTED`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateRun`] when called twice.
    pub fn start(&mut self) -> Result<Event, AdapterError> {
        self.run.start()
    }

    /// Translate one runtime event into zero or more protocol events.
    ///
    /// Payloads within the event are processed in priority order: error,
    /// state, text, function call, function result, final marker. Internal
    /// adapter failures are caught here and converted into a terminal
    /// `RUN_ERROR` — this method never panics and never leaves the sequence
    /// unterminated on a failure it can see.
    pub fn handle(&mut self, event: &RuntimeEvent) -> Vec<Event> {
        if self.run.is_terminal() {
            warn!(
                run_id = %self.run.run_id(),
                "dropping runtime event received after terminal event"
            );
            return Vec::new();
        }

        let mut out = Vec::new();
        if let Err(err) = self.translate(event, &mut out) {
            warn!(
                run_id = %self.run.run_id(),
                error = %err,
                "adapter failure while translating runtime event"
            );
            out.extend(self.abort(err.to_string(), err.code()));
        }
        out
    }

    fn translate(
        &mut self,
        event: &RuntimeEvent,
        out: &mut Vec<Event>,
    ) -> Result<(), AdapterError> {
        // Runtime-reported errors preempt everything else in the event.
        if let Some(message) = &event.error_message {
            out.extend(self.abort(message.clone(), codes::RUNTIME_ERROR));
            return Ok(());
        }

        self.run.ensure_active()?;

        if let Some(state) = &event.state_delta {
            // The feed carries full state values; the synchronizer decides
            // between an initial snapshot and an RFC 6902 delta, and elides
            // no-op updates entirely.
            out.extend(self.state.delta(state));
        }

        if let Some(chunk) = &event.text_chunk {
            self.text(chunk, event, out)?;
        }

        if let Some(call) = &event.function_call {
            // Tool framing closes any open message so the call's parent is
            // a completed message, not a dangling stream.
            let parent = self.message.open_id().map(str::to_string);
            out.extend(self.message.end());
            out.extend(self.tools.start(&call.id, &call.name, parent));
            if !matches!(call.arguments.as_str(), "" | "{}" | "null") {
                out.push(self.tools.args_by_call_id(&call.id, &call.arguments)?);
            }
        }

        if let Some(result) = &event.function_result {
            match self.tools.end_by_call_id(&result.call_id) {
                Some(end) => out.push(end),
                None => warn!(
                    call_id = %result.call_id,
                    is_error = result.is_error,
                    "tool result does not match any open tool call; ignoring"
                ),
            }
        }

        if event.is_final {
            out.extend(self.finish(None));
        }

        Ok(())
    }

    fn text(
        &mut self,
        chunk: &str,
        event: &RuntimeEvent,
        out: &mut Vec<Event>,
    ) -> Result<(), AdapterError> {
        if chunk.is_empty() {
            debug!(run_id = %self.run.run_id(), "skipping empty text chunk");
            return Ok(());
        }

        if self.message.open_id().is_none() {
            out.push(self.message.start(mint_message_id())?);
        }
        if event.is_partial {
            out.push(self.message.chunk(None, None, Some(chunk.to_string())));
        } else {
            out.push(self.message.content(chunk)?);
        }
        if event.turn_complete {
            out.extend(self.message.end());
        }
        Ok(())
    }

    /// Finish the run successfully, implicitly closing anything still open.
    ///
    /// Returns no events when the run is already terminal.
    pub fn finish(&mut self, result: Option<Value>) -> Vec<Event> {
        if self.run.is_terminal() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.close_open(&mut out);
        match self.run.finish(result) {
            Ok(event) => out.push(event),
            // Only reachable from an idle run; still terminate the stream.
            Err(err) => {
                if let Ok(event) = self
                    .run
                    .error(err.to_string(), Some(codes::ADAPTER_INTERNAL_ERROR.to_string()))
                {
                    out.push(event);
                }
            }
        }
        out
    }

    /// Terminate the run with `RUN_ERROR`, implicitly closing anything
    /// still open.
    ///
    /// Returns no events when the run is already terminal — a run gets
    /// exactly one terminal event.
    pub fn abort(&mut self, message: impl Into<String>, code: &str) -> Vec<Event> {
        if self.run.is_terminal() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.close_open(&mut out);
        if let Ok(event) = self.run.error(message, Some(code.to_string())) {
            out.push(event);
        }
        out
    }

    /// Build a `MESSAGES_SNAPSHOT` from the runtime's history.
    ///
    /// Runtime roles are normalized to protocol roles (`model` becomes
    /// `assistant`); unrecognized roles default to `user`, matching how the
    /// runtime stores tool results in its history.
    #[must_use]
    pub fn messages_snapshot(&self, history: &[HistoryMessage]) -> Event {
        let run_id = self.run.run_id();
        let messages = history
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let role = match entry.role.as_str() {
                    "model" | "assistant" => Role::Assistant,
                    "system" => Role::System,
                    "tool" => Role::Tool,
                    _ => Role::User,
                };
                Message::new(format!("hist_{run_id}_{index}"), role, &entry.content)
            })
            .collect();
        Event::messages_snapshot(messages)
    }

    fn close_open(&mut self, out: &mut Vec<Event>) {
        out.extend(self.message.end());
        out.extend(self.tools.close_all());
    }
}

fn mint_message_id() -> String {
    format!("msg_{}", Uuid::new_v4().simple())
}
