//! UI-side handle for handing utterances to the speech worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use crate::engine::StopSignal;
use crate::error::SpeechError;
use crate::types::Utterance;

/// A message on the handoff queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Speak this utterance.
    Speak(Utterance),
    /// Sentinel that ends the worker loop.
    Exit,
}

/// Where the single utterance slot currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InFlightState {
    /// Nothing queued or speaking; a new request may be submitted.
    Idle = 0,
    /// A request has been queued but the worker has not picked it up.
    Pending = 1,
    /// The worker is speaking.
    Speaking = 2,
}

impl InFlightState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Pending,
            2 => Self::Speaking,
            _ => Self::Idle,
        }
    }
}

/// Atomic marker guarding the "one utterance in flight" invariant.
///
/// The submitter reserves the slot with a compare-and-swap before pushing, so
/// a double press can never queue two utterances.
#[derive(Debug)]
pub(crate) struct InFlight(AtomicU8);

impl Default for InFlight {
    fn default() -> Self {
        Self(AtomicU8::new(InFlightState::Idle as u8))
    }
}

impl InFlight {
    pub(crate) fn state(&self) -> InFlightState {
        InFlightState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// `Idle -> Pending`. Returns `false` if the slot is taken.
    pub(crate) fn try_reserve(&self) -> bool {
        self.transition(InFlightState::Idle, InFlightState::Pending)
    }

    /// `Pending -> Idle`, for a reservation whose request was never delivered.
    pub(crate) fn cancel_reservation(&self) {
        self.transition(InFlightState::Pending, InFlightState::Idle);
    }

    pub(crate) fn mark_speaking(&self) {
        self.0.store(InFlightState::Speaking as u8, Ordering::Release);
    }

    /// `Speaking -> Idle`. Leaves a newer `Pending` reservation untouched.
    pub(crate) fn release_speaking(&self) {
        self.transition(InFlightState::Speaking, InFlightState::Idle);
    }

    fn transition(&self, from: InFlightState, to: InFlightState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Result of [`SpeechClient::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The utterance was pushed onto the handoff queue.
    Queued,
    /// The input was empty after trimming; nothing was queued.
    Empty,
    /// Another utterance is already queued or speaking; nothing was queued.
    Busy,
}

/// Producer side of the handoff queue, owned by the UI thread.
#[derive(Debug, Clone)]
pub struct SpeechClient {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    in_flight: Arc<InFlight>,
    stop: StopSignal,
}

impl SpeechClient {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<WorkerRequest>,
        in_flight: Arc<InFlight>,
        stop: StopSignal,
    ) -> Self {
        Self {
            requests,
            in_flight,
            stop,
        }
    }

    /// Queues `input` for speech if it is non-blank and the slot is free.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::WorkerUnavailable`] if the worker has exited.
    pub fn submit(&self, input: &str) -> Result<SubmitOutcome, SpeechError> {
        let Some(utterance) = Utterance::from_input(input) else {
            return Ok(SubmitOutcome::Empty);
        };

        if !self.in_flight.try_reserve() {
            debug!(state = ?self.in_flight.state(), "utterance already in flight");
            return Ok(SubmitOutcome::Busy);
        }

        if self.requests.send(WorkerRequest::Speak(utterance)).is_err() {
            self.in_flight.cancel_reservation();
            return Err(SpeechError::WorkerUnavailable);
        }

        Ok(SubmitOutcome::Queued)
    }

    /// Interrupts the utterance being spoken and frees the slot right away.
    ///
    /// The worker may still be unwinding from the engine call; a request
    /// submitted now waits in the queue behind it.
    pub fn stop(&self) {
        self.stop.raise();
        self.in_flight.release_speaking();
    }

    /// Sends the exit sentinel to the worker.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::WorkerUnavailable`] if the worker has already
    /// exited.
    pub fn request_exit(&self) -> Result<(), SpeechError> {
        self.requests
            .send(WorkerRequest::Exit)
            .map_err(|_| SpeechError::WorkerUnavailable)
    }

    /// Current state of the utterance slot.
    pub fn in_flight(&self) -> InFlightState {
        self.in_flight.state()
    }
}
