//! # agio-core
//!
//! Event schema and state synchronization for the AG-UI protocol.
//!
//! AG-UI is a wire protocol for streaming an AI agent's execution — text
//! generation, tool invocation, state changes, run lifecycle — to a UI
//! client. This crate hosts the protocol's vocabulary: the closed set of
//! [`Event`] variants, the message types carried by snapshots, and the
//! RFC 6902 (JSON Patch) state synchronizer used to ship incremental state
//! updates.
//!
//! ```text
//! ┌──────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  Agent runtime   │───▶│  agio-adapter    │───▶│  Transport sink │
//! │  (event feed)    │    │  (translation)   │    │  (SSE, ...)     │
//! └──────────────────┘    └────────┬─────────┘    └─────────────────┘
//!                                  │
//!                         ┌────────▼─────────┐
//!                         │   agio-core      │
//!                         │   (this crate)   │
//!                         │ - Event schema   │
//!                         │ - Messages       │
//!                         │ - State sync     │
//!                         └──────────────────┘
//! ```
//!
//! ## Events
//!
//! Every protocol event is one variant of [`Event`], tagged on the wire with
//! a `SCREAMING_SNAKE_CASE` `type` field and camelCase payload fields:
//!
//! ```rust
//! use agio_core::Event;
//!
//! let event = Event::text_message_content("msg_1", "Hello")?;
//! let json = serde_json::to_value(&event)?;
//! assert_eq!(json["type"], "TEXT_MESSAGE_CONTENT");
//! assert_eq!(json["messageId"], "msg_1");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Construction is where validation happens: content and argument deltas
//! must be non-empty, and state deltas must be well-formed JSON Patch
//! documents. There is no way to build a malformed event.
//!
//! ## State synchronization
//!
//! [`StateSynchronizer`] tracks the last state baseline and produces either
//! full [`Event::StateSnapshot`]s or minimal [`Event::StateDelta`] patches:
//!
//! ```rust
//! use agio_core::StateSynchronizer;
//! use serde_json::json;
//!
//! let mut sync = StateSynchronizer::new();
//! sync.snapshot(&json!({"count": 0}));
//! let delta = sync.delta(&json!({"count": 1}));
//! assert!(delta.is_some());
//! ```

mod error;
mod event;
mod sync;
mod types;

pub use error::{EventError, PatchError};
pub use event::{BaseEvent, Event};
pub use sync::{StateSynchronizer, apply, diff};
pub use types::{Message, Role};

// Typed JSON Patch payloads are part of the public event surface.
pub use json_patch::Patch;
