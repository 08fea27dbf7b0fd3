//! # agio-sse
//!
//! Server-sent-events framing for AG-UI protocol events.
//!
//! This is transport glue, deliberately thin: each [`Event`] becomes one
//! `data: <json>\n\n` frame. HTTP routing, content negotiation, and stream
//! lifetime belong to the embedding web framework; the encoder only knows
//! how to turn events into frames.
//!
//! ```rust
//! use agio_core::Event;
//! use agio_sse::EventEncoder;
//!
//! let encoder = EventEncoder::new(None);
//! let frame = encoder.encode(&Event::run_started("t1", "run_1"))?;
//! assert!(frame.starts_with("data: {"));
//! assert!(frame.ends_with("\n\n"));
//! # Ok::<(), agio_sse::EncodeError>(())
//! ```

use agio_core::Event;
use thiserror::Error;

/// Content type of an SSE event stream.
pub const TEXT_EVENT_STREAM: &str = "text/event-stream";

/// AG-UI media type, for clients negotiating the event encoding.
pub const AGUI_MEDIA_TYPE: &str = "application/vnd.ag-ui.event+json";

/// An event could not be encoded into a frame.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Encodes protocol events as SSE frames.
#[derive(Debug, Clone, Default)]
pub struct EventEncoder {
    accept: Option<String>,
}

impl EventEncoder {
    /// Create an encoder, optionally remembering the client's `Accept`
    /// header for content negotiation.
    #[must_use]
    pub fn new(accept: Option<&str>) -> Self {
        Self {
            accept: accept.map(str::to_string),
        }
    }

    /// The `Accept` value this encoder was negotiated with, if any.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Content type to advertise on the response.
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        TEXT_EVENT_STREAM
    }

    /// Encode one event as an SSE frame.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Serialize`] when the event's payload cannot be
    /// serialized (e.g. a non-finite float inside a raw value).
    pub fn encode(&self, event: &Event) -> Result<String, EncodeError> {
        let json = serde_json::to_string(event)?;
        Ok(format!("data: {json}\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_are_sse_shaped() {
        let encoder = EventEncoder::new(None);
        let frame = encoder
            .encode(&Event::text_message_content("msg_1", "hi").unwrap())
            .unwrap();
        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));

        let payload: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(payload["type"], "TEXT_MESSAGE_CONTENT");
        assert_eq!(payload["messageId"], "msg_1");
        assert_eq!(payload["delta"], "hi");
    }

    #[test]
    fn omitted_fields_stay_off_the_wire() {
        let encoder = EventEncoder::new(None);
        let frame = encoder.encode(&Event::run_error("boom", None)).unwrap();
        assert_eq!(frame, "data: {\"type\":\"RUN_ERROR\",\"message\":\"boom\"}\n\n");
    }

    #[test]
    fn accept_header_is_remembered() {
        let encoder = EventEncoder::new(Some(AGUI_MEDIA_TYPE));
        assert_eq!(encoder.accept(), Some(AGUI_MEDIA_TYPE));
        assert_eq!(encoder.content_type(), TEXT_EVENT_STREAM);
    }

    #[test]
    fn state_snapshot_round_trips_through_a_frame() {
        let encoder = EventEncoder::new(None);
        let event = Event::state_snapshot(json!({"steps": [{"status": "pending"}]}));
        let frame = encoder.encode(&event).unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(payload["snapshot"]["steps"][0]["status"], "pending");
    }
}
