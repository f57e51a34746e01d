//! Talkbox library: speech coordination for the talkbox window.
//!
//! This library owns everything below the UI: the data model, the engine
//! seam, the host engine adapter, and the background worker that keeps
//! synthesis off the UI thread.
//!
//! ## Core Types
//!
//! - [`Utterance`] - Trimmed, non-empty text submitted for speech
//! - [`VoiceDescriptor`] - A voice offered by the engine
//! - [`SpeechRate`] - Words per minute, clamped to `[50, 300]`
//! - [`SpeechSettings`] - Live voice/rate selection shared with the worker
//!
//! ## Engines
//!
//! - [`SpeechEngine`] - The operations the worker needs from an engine
//! - [`SystemEngine`] - Host speech via the `tts` crate
//! - [`StopSignal`] / [`StopToken`] - Cross-thread interruption
//!
//! ## Worker
//!
//! - [`SpeechWorker`] - Dedicated engine thread with a FIFO handoff queue
//! - [`SpeechClient`] - UI-side producer guarding one utterance in flight
//! - [`WorkerEvent`] - Status updates drained by the UI loop

mod client;
mod engine;
mod error;
mod system;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod types;
mod worker;

pub use client::{InFlightState, SpeechClient, SubmitOutcome, WorkerRequest};
pub use engine::{SpeechEngine, StopSignal, StopToken};
pub use error::SpeechError;
pub use system::SystemEngine;
pub use types::{
    DEFAULT_RATE, MAX_RATE, MIN_RATE, SpeechParameters, SpeechRate, SpeechSettings, Utterance,
    VoiceDescriptor, find_voice_by_name,
};
pub use worker::{
    SpawnedWorker, SpeechOutcome, SpeechWorker, WORKER_THREAD_NAME, WorkerEvent, WorkerEvents,
};
