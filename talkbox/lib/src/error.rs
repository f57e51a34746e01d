//! Error types for the talkbox library.

use thiserror::Error;

/// Errors that can occur while driving the speech engine or its worker.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The host speech engine could not be initialized.
    #[error("speech engine initialization failed: {message}")]
    EngineInit {
        /// Description reported by the engine backend.
        message: String,
    },

    /// An engine call failed while configuring or producing speech.
    #[error("speech engine failed during {operation}: {message}")]
    Engine {
        /// The engine operation that failed (e.g. `say`, `set_rate`).
        operation: &'static str,
        /// Description reported by the engine backend.
        message: String,
    },

    /// The worker thread is gone, so requests can no longer be delivered.
    #[error("speech worker is no longer running")]
    WorkerUnavailable,

    /// The worker thread could not be started.
    #[error("failed to spawn speech worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// The worker thread panicked outside the per-utterance recovery boundary.
    #[error("speech worker panicked")]
    WorkerPanicked,
}

impl SpeechError {
    /// Builds an [`SpeechError::Engine`] from any displayable backend error.
    pub fn engine(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Engine {
            operation,
            message: source.to_string(),
        }
    }
}
