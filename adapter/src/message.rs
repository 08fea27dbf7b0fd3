//! Text message framing state machine.

use agio_core::{Event, Role};

use crate::error::AdapterError;

/// Frames streamed text into `TEXT_MESSAGE_START` / `CONTENT` / `END`
/// triples, with at most one message open at a time.
#[derive(Debug, Default)]
pub struct TextMessageState {
    open: Option<OpenMessage>,
}

#[derive(Debug)]
struct OpenMessage {
    message_id: String,
    buffer: String,
}

impl TextMessageState {
    /// Create with no open message.
    #[must_use]
    pub const fn new() -> Self {
        Self { open: None }
    }

    /// Id of the currently open message, if any.
    #[must_use]
    pub fn open_id(&self) -> Option<&str> {
        self.open.as_ref().map(|m| m.message_id.as_str())
    }

    /// Content accumulated by the open message so far.
    #[must_use]
    pub fn buffered(&self) -> Option<&str> {
        self.open.as_ref().map(|m| m.buffer.as_str())
    }

    /// Open a message, emitting `TEXT_MESSAGE_START`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MessageAlreadyOpen`] when a message is still
    /// streaming — the runtime must not interleave two text streams within
    /// one run.
    pub fn start(&mut self, message_id: impl Into<String>) -> Result<Event, AdapterError> {
        if let Some(open) = &self.open {
            return Err(AdapterError::MessageAlreadyOpen {
                message_id: open.message_id.clone(),
            });
        }
        let message_id = message_id.into();
        let event = Event::text_message_start(&message_id);
        self.open = Some(OpenMessage {
            message_id,
            buffer: String::new(),
        });
        Ok(event)
    }

    /// Append content to the open message, emitting `TEXT_MESSAGE_CONTENT`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NoOpenMessage`] when no message is open, or
    /// the underlying validation error for an empty delta.
    pub fn content(&mut self, delta: &str) -> Result<Event, AdapterError> {
        let open = self.open.as_mut().ok_or(AdapterError::NoOpenMessage)?;
        let event = Event::text_message_content(&open.message_id, delta)?;
        open.buffer.push_str(delta);
        Ok(event)
    }

    /// Emit a self-describing `TEXT_MESSAGE_CHUNK`.
    ///
    /// Usable without a prior `start`; when a message is open and the chunk
    /// does not name a different one, the delta is credited to its buffer
    /// and the chunk carries the open message's id.
    pub fn chunk(
        &mut self,
        message_id: Option<String>,
        role: Option<Role>,
        delta: Option<String>,
    ) -> Event {
        let open_id = self.open_id().map(str::to_string);
        let belongs_to_open = match (&message_id, &open_id) {
            (Some(id), Some(open)) => id == open,
            (None, Some(_)) => true,
            _ => false,
        };
        if belongs_to_open {
            if let (Some(open), Some(delta)) = (self.open.as_mut(), &delta) {
                open.buffer.push_str(delta);
            }
        }
        Event::text_message_chunk(message_id.or(open_id), role, delta)
    }

    /// Close the open message, emitting `TEXT_MESSAGE_END`.
    ///
    /// Idempotent: closing when nothing is open produces no event and no
    /// error, tolerating runtimes that signal completion redundantly.
    pub fn end(&mut self) -> Option<Event> {
        self.open
            .take()
            .map(|open| Event::text_message_end(open.message_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_start_content_end() {
        let mut message = TextMessageState::new();
        let start = message.start("msg_1").unwrap();
        assert_eq!(start.event_type(), "TEXT_MESSAGE_START");

        message.content("Hello, ").unwrap();
        message.content("world").unwrap();
        assert_eq!(message.buffered(), Some("Hello, world"));

        let end = message.end().unwrap();
        assert_eq!(end.event_type(), "TEXT_MESSAGE_END");
        assert!(message.open_id().is_none());
    }

    #[test]
    fn second_start_is_rejected_while_open() {
        let mut message = TextMessageState::new();
        message.start("msg_1").unwrap();
        assert!(matches!(
            message.start("msg_2"),
            Err(AdapterError::MessageAlreadyOpen { message_id }) if message_id == "msg_1"
        ));
    }

    #[test]
    fn content_without_open_message_is_rejected() {
        let mut message = TextMessageState::new();
        assert!(matches!(
            message.content("hi"),
            Err(AdapterError::NoOpenMessage)
        ));
    }

    #[test]
    fn empty_delta_is_rejected() {
        let mut message = TextMessageState::new();
        message.start("msg_1").unwrap();
        assert!(matches!(message.content(""), Err(AdapterError::Event(_))));
        // Rejected delta is not credited to the buffer.
        assert_eq!(message.buffered(), Some(""));
    }

    #[test]
    fn end_is_idempotent() {
        let mut message = TextMessageState::new();
        message.start("msg_1").unwrap();
        assert!(message.end().is_some());
        assert!(message.end().is_none());
        assert!(message.end().is_none());
    }

    #[test]
    fn chunk_works_without_open_message() {
        let mut message = TextMessageState::new();
        let event = message.chunk(
            Some("msg_9".to_string()),
            Some(Role::Assistant),
            Some("hi".to_string()),
        );
        assert_eq!(event.event_type(), "TEXT_MESSAGE_CHUNK");
        assert!(message.open_id().is_none());
    }

    #[test]
    fn chunk_inherits_open_message_id_and_buffers() {
        let mut message = TextMessageState::new();
        message.start("msg_1").unwrap();
        let event = message.chunk(None, None, Some("partial".to_string()));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["messageId"], "msg_1");
        assert_eq!(message.buffered(), Some("partial"));
    }

    #[test]
    fn foreign_chunk_does_not_touch_open_buffer() {
        let mut message = TextMessageState::new();
        message.start("msg_1").unwrap();
        message.chunk(Some("msg_other".to_string()), None, Some("x".to_string()));
        assert_eq!(message.buffered(), Some(""));
    }
}
