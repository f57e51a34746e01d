//! The speech engine seam and the stop signal used to interrupt it.
//!
//! The worker thread owns the engine and is the only caller of these methods.
//! The UI thread never touches the engine directly; it interrupts speech by
//! raising a [`StopSignal`], which the engine observes from inside
//! [`SpeechEngine::run_and_wait`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SpeechError;
use crate::types::{SpeechRate, VoiceDescriptor};

/// Operations the worker needs from a text-to-speech engine.
///
/// Engines are created on the worker thread and never leave it, so they do
/// not have to be `Send`.
///
/// ## Examples
///
/// ```
/// use talkbox_lib::{SpeechEngine, SpeechError, SpeechRate, StopToken, VoiceDescriptor};
///
/// struct Silent;
///
/// impl SpeechEngine for Silent {
///     fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
///         Ok(vec![VoiceDescriptor::new("default", "Default")])
///     }
///     fn set_voice(&mut self, _id: &str) -> Result<(), SpeechError> { Ok(()) }
///     fn set_rate(&mut self, _rate: SpeechRate) -> Result<(), SpeechError> { Ok(()) }
///     fn say(&mut self, _text: &str) -> Result<(), SpeechError> { Ok(()) }
///     fn run_and_wait(&mut self, _stop: &StopToken) -> Result<(), SpeechError> { Ok(()) }
///     fn stop(&mut self) -> Result<(), SpeechError> { Ok(()) }
/// }
/// ```
pub trait SpeechEngine {
    /// Lists the voices currently available.
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>, SpeechError>;

    /// Selects the voice with the given engine identifier.
    fn set_voice(&mut self, id: &str) -> Result<(), SpeechError>;

    /// Applies a speaking rate.
    fn set_rate(&mut self, rate: SpeechRate) -> Result<(), SpeechError>;

    /// Queues text inside the engine. Does not block on audio.
    fn say(&mut self, text: &str) -> Result<(), SpeechError>;

    /// Blocks until queued speech finishes or `stop` is raised.
    ///
    /// When `stop` is raised the implementation must interrupt itself (for
    /// example by calling [`SpeechEngine::stop`]) and return promptly.
    fn run_and_wait(&mut self, stop: &StopToken) -> Result<(), SpeechError>;

    /// Interrupts any speech in progress. Best effort.
    fn stop(&mut self) -> Result<(), SpeechError>;
}

/// Cross-thread stop request for the utterance in progress.
///
/// The signal is an epoch counter rather than a boolean: every
/// [`raise`](StopSignal::raise) bumps the epoch, and a [`StopToken`] taken
/// when an utterance starts only reports stops raised after that point.
/// A stop aimed at one utterance therefore never cancels the next one.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    epoch: Arc<AtomicU64>,
}

impl StopSignal {
    /// Creates a signal with no stop raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that whatever is speaking now stops.
    pub fn raise(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Captures the current epoch.
    pub fn token(&self) -> StopToken {
        StopToken {
            epoch: Arc::clone(&self.epoch),
            taken_at: self.epoch.load(Ordering::Acquire),
        }
    }
}

/// Snapshot of a [`StopSignal`] taken when an utterance starts.
#[derive(Debug, Clone)]
pub struct StopToken {
    epoch: Arc<AtomicU64>,
    taken_at: u64,
}

impl StopToken {
    /// Returns `true` once a stop has been raised since the token was taken.
    pub fn is_raised(&self) -> bool {
        self.epoch.load(Ordering::Acquire) != self.taken_at
    }
}
