//! # agio
//!
//! Facade crate for the agio workspace: the AG-UI wire protocol plus the
//! adapter that streams an agent runtime's execution to UI clients as a
//! well-formed, strictly ordered protocol event sequence.
//!
//! - The event schema, message types, and JSON-Patch state synchronizer are
//!   re-exported from [`agio_core`] at the crate root.
//! - [`adapter`] (feature `adapter`, on by default) hosts the runtime-feed
//!   contract, the run/message/tool-call state machines, and the
//!   per-invocation drive loop.
//! - [`sse`] (feature `sse`, on by default) turns events into
//!   `data: <json>\n\n` frames for server-sent-events transports.
//!
//! ## Example
//!
//! ```rust
//! use agio::adapter::{drive, event_channel, CancelHandle, Invocation, RuntimeEvent};
//! use futures_lite::stream;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (sender, receiver) = event_channel(64);
//! let feed = stream::iter(vec![
//!     RuntimeEvent::text("inv_1", "Hello!").complete_turn(),
//!     RuntimeEvent::final_marker("inv_1"),
//! ]);
//!
//! let run = tokio::spawn(drive(
//!     Invocation::for_thread("thread_1"),
//!     feed,
//!     sender,
//!     CancelHandle::new(),
//! ));
//!
//! let encoder = agio::sse::EventEncoder::new(None);
//! while let Ok(event) = receiver.recv().await {
//!     print!("{}", encoder.encode(&event)?);
//! }
//! run.await??;
//! # Ok(())
//! # }
//! ```

pub use agio_core::*;

#[cfg(feature = "adapter")]
pub use agio_adapter as adapter;

#[cfg(feature = "sse")]
pub use agio_sse as sse;
