//! Run lifecycle state machine.

use agio_core::Event;
use serde_json::Value;

use crate::error::AdapterError;

/// Lifecycle phase of a run.
///
/// `Finished` and `Errored` are terminal: a run cannot restart, and no
/// further content events may be emitted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Created but not yet started.
    Idle,
    /// `RUN_STARTED` has been emitted.
    Started,
    /// `RUN_FINISHED` has been emitted.
    Finished,
    /// `RUN_ERROR` has been emitted.
    Errored,
}

/// Enforces start → content → terminal ordering for one run.
#[derive(Debug)]
pub struct RunState {
    thread_id: String,
    run_id: String,
    phase: RunPhase,
}

impl RunState {
    /// Create an idle run for the given invocation.
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            phase: RunPhase::Idle,
        }
    }

    /// The thread this run belongs to.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// The run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Whether a terminal event has been emitted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, RunPhase::Finished | RunPhase::Errored)
    }

    /// Start the run, emitting `RUN_STARTED`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateRun`] unless the run is idle — a run
    /// cannot start twice or restart after terminating.
    pub fn start(&mut self) -> Result<Event, AdapterError> {
        if self.phase == RunPhase::Idle {
            self.phase = RunPhase::Started;
            Ok(Event::run_started(&self.thread_id, &self.run_id))
        } else {
            Err(AdapterError::DuplicateRun {
                run_id: self.run_id.clone(),
            })
        }
    }

    /// Finish the run successfully, emitting `RUN_FINISHED`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRunState`] unless the run is started.
    pub fn finish(&mut self, result: Option<Value>) -> Result<Event, AdapterError> {
        if self.phase == RunPhase::Started {
            self.phase = RunPhase::Finished;
            Ok(Event::run_finished(&self.thread_id, &self.run_id, result))
        } else {
            Err(AdapterError::InvalidRunState { phase: self.phase })
        }
    }

    /// Terminate the run with an error, emitting `RUN_ERROR`.
    ///
    /// Accepted from `Idle` as well as `Started`, so adapter failures during
    /// setup still produce a terminal event for the stream.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRunState`] when already terminal.
    pub fn error(
        &mut self,
        message: impl Into<String>,
        code: Option<String>,
    ) -> Result<Event, AdapterError> {
        match self.phase {
            RunPhase::Idle | RunPhase::Started => {
                self.phase = RunPhase::Errored;
                Ok(Event::run_error(message, code))
            }
            phase => Err(AdapterError::InvalidRunState { phase }),
        }
    }

    /// Guard for content emission: the run must be started and not terminal.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRunState`] otherwise.
    pub const fn ensure_active(&self) -> Result<(), AdapterError> {
        match self.phase {
            RunPhase::Started => Ok(()),
            phase => Err(AdapterError::InvalidRunState { phase }),
        }
    }
}
