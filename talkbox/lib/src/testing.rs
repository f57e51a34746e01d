//! Scripted engine for tests.
//!
//! [`RecordingEngine`] records every call it receives and can be told to
//! hold `run_and_wait` open, fail the next `say`, or panic, so callers can
//! walk the worker through each state transition deterministically.
//!
//! Clones share state: keep one clone in the test and hand another to
//! [`SpeechWorker::spawn`](crate::SpeechWorker::spawn).

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::engine::{SpeechEngine, StopToken};
use crate::error::SpeechError;
use crate::types::{SpeechRate, VoiceDescriptor};

/// How often a held `run_and_wait` re-checks its stop token.
const HOLD_POLL: Duration = Duration::from_millis(5);

/// A call received by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `list_voices`.
    ListVoices,
    /// `set_voice` with the voice id.
    SetVoice(String),
    /// `set_rate` with the rate in words per minute.
    SetRate(u32),
    /// `say` with the text.
    Say(String),
    /// `run_and_wait`.
    RunAndWait,
    /// `stop`.
    Stop,
}

#[derive(Debug, Default)]
struct Script {
    voices: Vec<VoiceDescriptor>,
    calls: Vec<EngineCall>,
    hold: bool,
    releases: usize,
    fail_next_say: Option<String>,
    panic_next_say: bool,
}

/// Engine double that records calls and follows a script.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    shared: Arc<(Mutex<Script>, Condvar)>,
}

impl RecordingEngine {
    /// Creates an engine offering `voices`.
    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        let engine = Self::default();
        engine.script().voices = voices;
        engine
    }

    /// Replaces the voices returned by later listings.
    pub fn set_voices(&self, voices: Vec<VoiceDescriptor>) {
        self.script().voices = voices;
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.script().calls.clone()
    }

    /// Calls received so far, without voice listings.
    pub fn speech_calls(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| *call != EngineCall::ListVoices)
            .collect()
    }

    /// Forgets the calls recorded so far.
    pub fn clear_calls(&self) {
        self.script().calls.clear();
    }

    /// Makes every `run_and_wait` block until released or stopped.
    pub fn hold_speech(&self) {
        self.script().hold = true;
    }

    /// Lets one held `run_and_wait` return as if speech completed.
    pub fn release_speech(&self) {
        self.script().releases += 1;
        self.shared.1.notify_all();
    }

    /// Makes the next `say` return an engine error with `message`.
    pub fn fail_next_say(&self, message: impl Into<String>) {
        self.script().fail_next_say = Some(message.into());
    }

    /// Makes the next `say` panic.
    pub fn panic_next_say(&self) {
        self.script().panic_next_say = true;
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: EngineCall) {
        self.script().calls.push(call);
    }
}

impl SpeechEngine for RecordingEngine {
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        let mut script = self.script();
        script.calls.push(EngineCall::ListVoices);
        Ok(script.voices.clone())
    }

    fn set_voice(&mut self, id: &str) -> Result<(), SpeechError> {
        self.record(EngineCall::SetVoice(id.to_string()));
        Ok(())
    }

    fn set_rate(&mut self, rate: SpeechRate) -> Result<(), SpeechError> {
        self.record(EngineCall::SetRate(rate.wpm()));
        Ok(())
    }

    fn say(&mut self, text: &str) -> Result<(), SpeechError> {
        let (failure, panics) = {
            let mut script = self.script();
            script.calls.push(EngineCall::Say(text.to_string()));
            (
                script.fail_next_say.take(),
                std::mem::take(&mut script.panic_next_say),
            )
        };

        if panics {
            panic!("scripted engine panic");
        }
        match failure {
            Some(message) => Err(SpeechError::engine("say", message)),
            None => Ok(()),
        }
    }

    fn run_and_wait(&mut self, stop: &StopToken) -> Result<(), SpeechError> {
        self.record(EngineCall::RunAndWait);

        let (lock, released) = &*self.shared;
        let mut script = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while script.hold {
            if script.releases > 0 {
                script.releases -= 1;
                return Ok(());
            }
            if stop.is_raised() {
                drop(script);
                return self.stop();
            }
            script = released
                .wait_timeout(script, HOLD_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        self.record(EngineCall::Stop);
        Ok(())
    }
}
