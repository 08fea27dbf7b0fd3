//! Per-invocation consumption loop.
//!
//! Each invocation gets its own [`Translator`] and its own ordered outbound
//! channel; one single-threaded loop consumes runtime events and forwards
//! protocol events, so a run's state machines are never mutated
//! concurrently. Multiple invocations run fully independently.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use agio_core::Event;
use async_channel::{Receiver, Sender};
use event_listener::Event as CancelEvent;
use futures_core::Stream;
use futures_lite::{StreamExt, future};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AdapterError, codes};
use crate::feed::RuntimeEvent;
use crate::translator::Translator;

/// One agent execution, identified by a thread/run id pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Conversation thread the run belongs to.
    pub thread_id: String,
    /// Unique run identifier. A run cannot restart.
    pub run_id: String,
}

impl Invocation {
    /// Create an invocation from known identifiers.
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
        }
    }

    /// Mint a fresh run on an existing thread.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self::new(thread_id, format!("run_{}", Uuid::new_v4()))
    }

    /// Mint both identifiers.
    #[must_use]
    pub fn generate() -> Self {
        Self::for_thread(format!("thread_{}", Uuid::new_v4()))
    }
}

/// Cloneable cancellation signal for one invocation.
///
/// Cancelling wakes the drive loop out of its feed wait; the loop then
/// emits a terminal `RUN_ERROR` rather than silently disappearing, so
/// consumers always observe a definite end.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    cancelled: AtomicBool,
    event: CancelEvent,
}

impl Default for CancelInner {
    fn default() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            event: CancelEvent::new(),
        }
    }
}

impl CancelHandle {
    /// Create an uncancelled handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. Safe to call from any thread, any number of
    /// times.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.event.notify(usize::MAX);
    }

    /// Whether cancellation has been triggered.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is triggered.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let listener = self.inner.event.listen();
            if self.is_cancelled() {
                return;
            }
            listener.await;
        }
    }
}

/// Create the bounded outbound event channel for one invocation.
///
/// A full channel backpressures the drive loop until the transport sink
/// drains it.
#[must_use]
pub fn event_channel(capacity: usize) -> (Sender<Event>, Receiver<Event>) {
    async_channel::bounded(capacity)
}

enum Step {
    Feed(Option<RuntimeEvent>),
    Cancelled,
}

/// Consume a runtime event feed and emit the invocation's protocol events.
///
/// Emits `RUN_STARTED` first, then translates each feed item, and stops
/// after the run's terminal event. The outbound sequence is always
/// terminated: a feed that ends without a final marker is driven to
/// `RUN_FINISHED`, cancellation produces a `RUN_ERROR`, and the sender is
/// dropped on return so the receiver always observes end-of-stream.
///
/// The loop suspends only while waiting for the next feed item or while the
/// outbound channel backpressures; the feed wait is interrupted by
/// `cancel`.
///
/// # Errors
///
/// Returns [`AdapterError::ChannelClosed`] when the consumer dropped the
/// receiving side — the run can no longer be observed, so there is nothing
/// left to drive.
pub async fn drive<S>(
    invocation: Invocation,
    mut feed: S,
    events: Sender<Event>,
    cancel: CancelHandle,
) -> Result<(), AdapterError>
where
    S: Stream<Item = RuntimeEvent> + Unpin,
{
    let mut translator = Translator::new(&invocation.thread_id, &invocation.run_id);
    let started = translator.start()?;
    flush(&events, vec![started]).await?;

    loop {
        if cancel.is_cancelled() {
            return flush(&events, translator.abort("run cancelled", codes::CANCELLED)).await;
        }

        let step = future::or(async { Step::Feed(feed.next().await) }, async {
            cancel.cancelled().await;
            Step::Cancelled
        })
        .await;

        match step {
            Step::Cancelled => {
                debug!(run_id = %invocation.run_id, "invocation cancelled");
                return flush(&events, translator.abort("run cancelled", codes::CANCELLED)).await;
            }
            Step::Feed(None) => {
                debug!(run_id = %invocation.run_id, "feed exhausted without final marker");
                return flush(&events, translator.finish(None)).await;
            }
            Step::Feed(Some(event)) => {
                let out = translator.handle(&event);
                let terminal = translator.is_terminal();
                flush(&events, out).await?;
                if terminal {
                    return Ok(());
                }
            }
        }
    }
}

async fn flush(events: &Sender<Event>, batch: Vec<Event>) -> Result<(), AdapterError> {
    for event in batch {
        events
            .send(event)
            .await
            .map_err(|_| AdapterError::ChannelClosed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::stream;
    use serde_json::json;

    async fn collect(receiver: Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.recv().await {
            events.push(event);
        }
        events
    }

    fn types(events: &[Event]) -> Vec<&'static str> {
        events.iter().map(Event::event_type).collect()
    }

    #[tokio::test]
    async fn echo_run_end_to_end() {
        let (sender, receiver) = event_channel(16);
        let feed = stream::iter(vec![
            RuntimeEvent::text("inv_1", "Hello there!").complete_turn(),
            RuntimeEvent::final_marker("inv_1"),
        ]);
        let task = tokio::spawn(drive(
            Invocation::new("t1", "run_1"),
            feed,
            sender,
            CancelHandle::new(),
        ));

        let events = collect(receiver).await;
        task.await.unwrap().unwrap();
        assert_eq!(
            types(&events),
            vec![
                "RUN_STARTED",
                "TEXT_MESSAGE_START",
                "TEXT_MESSAGE_CONTENT",
                "TEXT_MESSAGE_END",
                "RUN_FINISHED",
            ]
        );
    }

    #[tokio::test]
    async fn feed_without_final_marker_still_terminates() {
        let (sender, receiver) = event_channel(16);
        let feed = stream::iter(vec![
            RuntimeEvent::text("inv_1", "partial answer").complete_turn()
        ]);
        tokio::spawn(drive(
            Invocation::new("t1", "run_1"),
            feed,
            sender,
            CancelHandle::new(),
        ));

        let events = collect(receiver).await;
        assert_eq!(events.last().unwrap().event_type(), "RUN_FINISHED");
    }

    #[tokio::test]
    async fn runtime_error_terminates_with_run_error() {
        let (sender, receiver) = event_channel(16);
        let feed = stream::iter(vec![
            RuntimeEvent::text("inv_1", "Attempting..."),
            RuntimeEvent::error("inv_1", "LLM failure"),
            // Anything after the terminal event is dropped by the translator.
            RuntimeEvent::text("inv_1", "ghost").complete_turn(),
        ]);
        tokio::spawn(drive(
            Invocation::new("t1", "run_1"),
            feed,
            sender,
            CancelHandle::new(),
        ));

        let events = collect(receiver).await;
        assert_eq!(
            types(&events),
            vec![
                "RUN_STARTED",
                "TEXT_MESSAGE_START",
                "TEXT_MESSAGE_CONTENT",
                "TEXT_MESSAGE_END",
                "RUN_ERROR",
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_wakes_feed_wait_and_terminates() {
        let (sender, receiver) = event_channel(16);
        let cancel = CancelHandle::new();
        let task = tokio::spawn(drive(
            Invocation::new("t1", "run_1"),
            stream::pending::<RuntimeEvent>(),
            sender,
            cancel.clone(),
        ));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.event_type(), "RUN_STARTED");

        cancel.cancel();
        let second = receiver.recv().await.unwrap();
        let value = serde_json::to_value(&second).unwrap();
        assert_eq!(value["type"], "RUN_ERROR");
        assert_eq!(value["code"], codes::CANCELLED);

        // Sender dropped on return: the stream has a definite end.
        assert!(receiver.recv().await.is_err());
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_receiver_surfaces_channel_closed() {
        let (sender, receiver) = event_channel(1);
        drop(receiver);
        let err = drive(
            Invocation::new("t1", "run_1"),
            stream::iter(Vec::<RuntimeEvent>::new()),
            sender,
            CancelHandle::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AdapterError::ChannelClosed));
    }

    #[tokio::test]
    async fn concurrent_invocations_are_independent() {
        let mut tasks = Vec::new();
        let mut receivers = Vec::new();
        for n in 0..3 {
            let invocation = Invocation::for_thread(format!("t{n}"));
            let run_id = invocation.run_id.clone();
            let (sender, receiver) = event_channel(16);
            let feed = stream::iter(vec![
                RuntimeEvent::text(format!("inv_{n}"), format!("answer {n}")).complete_turn(),
                RuntimeEvent::state(format!("inv_{n}"), json!({"n": n})),
                RuntimeEvent::final_marker(format!("inv_{n}")),
            ]);
            tasks.push(tokio::spawn(drive(
                invocation,
                feed,
                sender,
                CancelHandle::new(),
            )));
            receivers.push((run_id, receiver));
        }

        for (run_id, receiver) in receivers {
            let events = collect(receiver).await;
            let first = serde_json::to_value(&events[0]).unwrap();
            assert_eq!(first["type"], "RUN_STARTED");
            assert_eq!(first["runId"], run_id.as_str());
            assert_eq!(events.last().unwrap().event_type(), "RUN_FINISHED");
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    }

    #[test]
    fn generated_invocations_are_unique() {
        let a = Invocation::generate();
        let b = Invocation::generate();
        assert_ne!(a.run_id, b.run_id);
        assert_ne!(a.thread_id, b.thread_id);
        assert!(a.run_id.starts_with("run_"));
    }
}
