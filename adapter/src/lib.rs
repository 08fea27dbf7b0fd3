//! # agio-adapter
//!
//! Converts an agent runtime's internal event feed into a well-formed,
//! strictly ordered AG-UI protocol event sequence.
//!
//! The runtime collaborator emits [`RuntimeEvent`]s — text chunks, function
//! calls and results, state updates, errors, a final marker — in whatever
//! order and granularity it likes. The adapter owns the protocol-side
//! lifecycle: run start/terminal framing, text-message bracketing,
//! tool-call correlation, and state snapshot/delta synchronization. Its
//! ordering guarantees hold even when the feed is inconvenient, partial, or
//! erroring:
//!
//! - `RUN_STARTED` is first; exactly one `RUN_FINISHED` or `RUN_ERROR` is
//!   last — never zero, never two.
//! - Every `START` precedes its `CONTENT`/`ARGS` and its `END`; an `END`
//!   always precedes the next `START` reusing the same id slot.
//! - Errors implicitly close whatever is open, so no stream is left
//!   dangling on the wire.
//!
//! ## Driving an invocation
//!
//! ```rust,no_run
//! use agio_adapter::{drive, event_channel, CancelHandle, Invocation, RuntimeEvent};
//! use futures_lite::stream;
//!
//! # async fn demo() -> Result<(), agio_adapter::AdapterError> {
//! let invocation = Invocation::for_thread("thread_1");
//! let (sender, receiver) = event_channel(64);
//! let cancel = CancelHandle::new();
//!
//! let feed = stream::iter(vec![
//!     RuntimeEvent::text("inv_1", "Hello!").complete_turn(),
//!     RuntimeEvent::final_marker("inv_1"),
//! ]);
//!
//! // Forward `receiver` to the transport sink; the channel closes when
//! // the run reaches its terminal event.
//! drive(invocation, feed, sender, cancel).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Lower-level pieces — [`Translator`] and the individual state machines —
//! are public for runtimes that need custom drive loops.

mod error;
mod feed;
mod invocation;
mod message;
mod router;
mod run;
mod tool;
mod translator;

pub use error::{AdapterError, codes};
pub use feed::{FunctionCall, FunctionResult, HistoryMessage, RuntimeEvent};
pub use invocation::{CancelHandle, Invocation, drive, event_channel};
pub use message::TextMessageState;
pub use router::Router;
pub use run::{RunPhase, RunState};
pub use tool::{OpenToolCall, ToolCallRegistry};
pub use translator::Translator;

// Outbound channel halves, re-exported so callers don't need a direct
// async-channel dependency.
pub use async_channel::{Receiver, Sender};
