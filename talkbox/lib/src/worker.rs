//! The speech worker: a dedicated thread that owns the engine.
//!
//! The worker consumes the handoff queue one request at a time and reports
//! progress on a status channel that the UI drains from its own loop, so the
//! UI never has to be touched from this thread.
//!
//! ## Event Flow
//!
//! 1. The UI submits text through [`SpeechClient::submit`]
//! 2. The worker picks the utterance up and emits [`WorkerEvent::Started`]
//! 3. Voice and rate are read from the live [`SpeechSettings`] and applied
//! 4. The engine speaks until done or until the stop signal is raised
//! 5. [`WorkerEvent::Finished`] carries the [`SpeechOutcome`]
//!
//! ## Examples
//!
//! ```no_run
//! use talkbox_lib::{SpeechSettings, SpeechWorker, SystemEngine};
//!
//! # fn main() -> Result<(), talkbox_lib::SpeechError> {
//! let spawned = SpeechWorker::spawn(SystemEngine::new, SpeechSettings::default())?;
//! spawned.client.submit("Hello world.")?;
//! spawned.client.request_exit()?;
//! spawned.worker.join()?;
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::client::{InFlight, SpeechClient, WorkerRequest};
use crate::engine::{SpeechEngine, StopSignal, StopToken};
use crate::error::SpeechError;
use crate::types::{SpeechParameters, SpeechSettings, Utterance, VoiceDescriptor, find_voice_by_name};

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "talkbox-speech";

/// How an utterance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// The engine finished speaking on its own.
    Completed,
    /// A stop was raised while speaking.
    Stopped,
    /// The engine reported an error (or panicked); the worker kept running.
    Failed(String),
}

/// Status updates from the worker to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The worker picked up an utterance and is about to speak it.
    Started,
    /// The current utterance ended.
    Finished(SpeechOutcome),
}

/// Receiving end of the worker status channel.
#[derive(Debug)]
pub struct WorkerEvents {
    rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl WorkerEvents {
    /// Takes every event that has arrived so far without blocking.
    pub fn drain(&mut self) -> Vec<WorkerEvent> {
        std::iter::from_fn(|| self.rx.try_recv().ok()).collect()
    }

    /// Blocks until the next event, or returns `None` once the worker is gone
    /// and every event has been taken.
    pub fn wait_next(&mut self) -> Option<WorkerEvent> {
        self.rx.blocking_recv()
    }
}

/// Everything the UI needs after starting the worker.
#[derive(Debug)]
pub struct SpawnedWorker {
    /// Join handle for the worker thread.
    pub worker: SpeechWorker,
    /// Producer side of the handoff queue.
    pub client: SpeechClient,
    /// Status updates for the UI loop to drain.
    pub events: WorkerEvents,
    /// Voices the engine offered at startup.
    pub voices: Vec<VoiceDescriptor>,
}

/// Handle to the running worker thread.
#[derive(Debug)]
pub struct SpeechWorker {
    handle: JoinHandle<()>,
}

impl SpeechWorker {
    /// Starts the worker thread and waits for its engine to come up.
    ///
    /// `factory` runs on the worker thread, so the engine never crosses
    /// threads. Once the engine is built its voices are listed and returned
    /// in [`SpawnedWorker::voices`].
    ///
    /// ## Errors
    ///
    /// Returns the factory's or the voice listing's error if the engine could
    /// not be brought up, [`SpeechError::WorkerSpawn`] if the thread could not
    /// be created, and [`SpeechError::WorkerPanicked`] if startup panicked.
    pub fn spawn<E, F>(factory: F, settings: SpeechSettings) -> Result<SpawnedWorker, SpeechError>
    where
        E: SpeechEngine + 'static,
        F: FnOnce() -> Result<E, SpeechError> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let in_flight = Arc::new(InFlight::default());
        let stop = StopSignal::new();

        let worker_loop = WorkerLoop {
            settings,
            in_flight: Arc::clone(&in_flight),
            stop: stop.clone(),
            events: event_tx,
        };

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let started = factory().and_then(|mut engine| {
                    let voices = engine.list_voices()?;
                    Ok((engine, voices))
                });

                match started {
                    Ok((mut engine, voices)) => {
                        debug!(count = voices.len(), "speech engine ready");
                        if ready_tx.send(Ok(voices)).is_ok() {
                            worker_loop.run(&mut engine, request_rx);
                        }
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })?;

        let voices = match ready_rx.blocking_recv() {
            Ok(Ok(voices)) => voices,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(SpeechError::WorkerPanicked);
            }
        };

        Ok(SpawnedWorker {
            worker: SpeechWorker { handle },
            client: SpeechClient::new(request_tx, in_flight, stop),
            events: WorkerEvents { rx: event_rx },
            voices,
        })
    }

    /// Returns `true` once the worker loop has terminated.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker thread to exit.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::WorkerPanicked`] if the thread panicked.
    pub fn join(self) -> Result<(), SpeechError> {
        self.handle.join().map_err(|_| SpeechError::WorkerPanicked)
    }
}

/// State moved onto the worker thread.
struct WorkerLoop {
    settings: SpeechSettings,
    in_flight: Arc<InFlight>,
    stop: StopSignal,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl WorkerLoop {
    fn run<E: SpeechEngine>(
        self,
        engine: &mut E,
        mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    ) {
        while let Some(request) = requests.blocking_recv() {
            match request {
                WorkerRequest::Speak(utterance) => self.serve(engine, &utterance),
                WorkerRequest::Exit => {
                    debug!("exit requested; speech worker stopping");
                    return;
                }
            }
        }
        debug!("handoff queue closed; speech worker stopping");
    }

    /// One `Idle -> Speaking -> Idle` cycle. Never propagates failures.
    fn serve<E: SpeechEngine>(&self, engine: &mut E, utterance: &Utterance) {
        self.in_flight.mark_speaking();
        let stop = self.stop.token();
        self.post(WorkerEvent::Started);

        let params = self.settings.snapshot();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            speak(engine, &params, utterance, &stop)
        }));

        let outcome = match result {
            Ok(Ok(())) if stop.is_raised() => SpeechOutcome::Stopped,
            Ok(Ok(())) => SpeechOutcome::Completed,
            Ok(Err(e)) => {
                error!(error = %e, "error in speech worker");
                SpeechOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "speech engine panicked");
                SpeechOutcome::Failed(message)
            }
        };

        debug!(?outcome, "utterance finished");
        self.in_flight.release_speaking();
        self.post(WorkerEvent::Finished(outcome));
    }

    fn post(&self, event: WorkerEvent) {
        if self.events.send(event).is_err() {
            debug!("status receiver dropped; event discarded");
        }
    }
}

/// Applies voice and rate, then speaks `utterance` to completion or stop.
fn speak<E: SpeechEngine>(
    engine: &mut E,
    params: &SpeechParameters,
    utterance: &Utterance,
    stop: &StopToken,
) -> Result<(), SpeechError> {
    if let Some(name) = params.voice_name.as_deref() {
        let voices = engine.list_voices()?;
        match find_voice_by_name(&voices, name) {
            Some(voice) => engine.set_voice(&voice.id)?,
            None => debug!(voice = name, "selected voice not available; keeping engine voice"),
        }
    }

    engine.set_rate(params.rate)?;
    engine.say(utterance.text())?;
    engine.run_and_wait(stop)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "speech engine panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{InFlightState, SubmitOutcome};
    use crate::testing::{EngineCall, RecordingEngine};
    use crate::types::SpeechRate;

    fn alice_and_bob() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("v1", "Alice"),
            VoiceDescriptor::new("v2", "Bob"),
        ]
    }

    fn settings_for(voice: Option<&str>, rate: u32) -> SpeechSettings {
        SpeechSettings::new(SpeechParameters {
            voice_name: voice.map(str::to_string),
            rate: SpeechRate::new(rate),
        })
    }

    fn spawn(engine: &RecordingEngine, settings: SpeechSettings) -> SpawnedWorker {
        let engine = engine.clone();
        SpeechWorker::spawn(move || Ok(engine), settings).unwrap()
    }

    fn shut_down(spawned: SpawnedWorker) {
        spawned.client.request_exit().unwrap();
        spawned.worker.join().unwrap();
    }

    #[test]
    fn spawn_returns_startup_voices() {
        let engine = RecordingEngine::with_voices(alice_and_bob());
        let spawned = spawn(&engine, SpeechSettings::default());

        assert_eq!(spawned.voices, alice_and_bob());
        shut_down(spawned);
    }

    #[test]
    fn spawn_propagates_engine_init_failure() {
        let result = SpeechWorker::spawn(
            || -> Result<RecordingEngine, SpeechError> {
                Err(SpeechError::EngineInit {
                    message: "no backend".into(),
                })
            },
            SpeechSettings::default(),
        );

        assert!(matches!(result, Err(SpeechError::EngineInit { .. })));
    }

    #[test]
    fn speaks_with_selected_voice_and_rate() {
        let engine = RecordingEngine::with_voices(alice_and_bob());
        let mut spawned = spawn(&engine, settings_for(Some("Alice"), 175));
        engine.clear_calls();

        assert_eq!(spawned.client.submit("Hello world.").unwrap(), SubmitOutcome::Queued);
        assert_eq!(spawned.events.wait_next(), Some(WorkerEvent::Started));
        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Completed))
        );

        assert_eq!(
            engine.speech_calls(),
            vec![
                EngineCall::SetVoice("v1".into()),
                EngineCall::SetRate(175),
                EngineCall::Say("Hello world.".into()),
                EngineCall::RunAndWait,
            ]
        );
        assert_eq!(spawned.client.in_flight(), InFlightState::Idle);
        shut_down(spawned);
    }

    #[test]
    fn missing_voice_falls_back_to_engine_voice() {
        let engine = RecordingEngine::with_voices(alice_and_bob());
        let mut spawned = spawn(&engine, settings_for(Some("Alice"), 200));
        engine.set_voices(vec![VoiceDescriptor::new("v2", "Bob")]);
        engine.clear_calls();

        spawned.client.submit("still speaks").unwrap();
        spawned.events.wait_next();
        spawned.events.wait_next();

        let calls = engine.speech_calls();
        assert!(!calls.iter().any(|call| matches!(call, EngineCall::SetVoice(_))));
        assert!(calls.contains(&EngineCall::Say("still speaks".into())));
        shut_down(spawned);
    }

    #[test]
    fn settings_are_read_when_speech_starts() {
        let engine = RecordingEngine::with_voices(alice_and_bob());
        let settings = settings_for(Some("Alice"), 175);
        let mut spawned = spawn(&engine, settings.clone());
        engine.clear_calls();

        settings.set_voice_name(Some("Bob".into()));
        settings.set_rate(SpeechRate::new(250));
        spawned.client.submit("changed").unwrap();
        spawned.events.wait_next();
        spawned.events.wait_next();

        let calls = engine.speech_calls();
        assert_eq!(calls[0], EngineCall::SetVoice("v2".into()));
        assert_eq!(calls[1], EngineCall::SetRate(250));
        shut_down(spawned);
    }

    #[test]
    fn engine_error_is_contained_and_loop_continues() {
        let engine = RecordingEngine::with_voices(alice_and_bob());
        let mut spawned = spawn(&engine, SpeechSettings::default());
        engine.fail_next_say("audio device unavailable");

        spawned.client.submit("first").unwrap();
        assert_eq!(spawned.events.wait_next(), Some(WorkerEvent::Started));
        let Some(WorkerEvent::Finished(SpeechOutcome::Failed(message))) =
            spawned.events.wait_next()
        else {
            panic!("expected a failed outcome");
        };
        assert!(message.contains("audio device unavailable"));
        assert_eq!(spawned.client.in_flight(), InFlightState::Idle);

        spawned.client.submit("second").unwrap();
        spawned.events.wait_next();
        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Completed))
        );
        shut_down(spawned);
    }

    #[test]
    fn engine_panic_is_contained() {
        let engine = RecordingEngine::with_voices(Vec::new());
        let mut spawned = spawn(&engine, SpeechSettings::default());
        engine.panic_next_say();

        spawned.client.submit("boom").unwrap();
        spawned.events.wait_next();
        assert!(matches!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Failed(_)))
        ));

        spawned.client.submit("after").unwrap();
        spawned.events.wait_next();
        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Completed))
        );
        shut_down(spawned);
    }

    #[test]
    fn stop_interrupts_blocking_speech() {
        let engine = RecordingEngine::with_voices(Vec::new());
        engine.hold_speech();
        let mut spawned = spawn(&engine, SpeechSettings::default());

        spawned.client.submit("a long paragraph").unwrap();
        assert_eq!(spawned.events.wait_next(), Some(WorkerEvent::Started));
        assert_eq!(spawned.client.in_flight(), InFlightState::Speaking);

        spawned.client.stop();
        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Stopped))
        );
        assert!(engine.calls().contains(&EngineCall::Stop));
        shut_down(spawned);
    }

    #[test]
    fn stop_does_not_cancel_the_next_utterance() {
        let engine = RecordingEngine::with_voices(Vec::new());
        engine.hold_speech();
        let mut spawned = spawn(&engine, SpeechSettings::default());

        spawned.client.submit("first").unwrap();
        spawned.events.wait_next();
        spawned.client.stop();
        assert_eq!(spawned.client.submit("second").unwrap(), SubmitOutcome::Queued);

        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Stopped))
        );
        assert_eq!(spawned.events.wait_next(), Some(WorkerEvent::Started));

        engine.release_speech();
        assert_eq!(
            spawned.events.wait_next(),
            Some(WorkerEvent::Finished(SpeechOutcome::Completed))
        );
        shut_down(spawned);
    }

    #[test]
    fn exit_sentinel_terminates_thread() {
        let engine = RecordingEngine::with_voices(Vec::new());
        let mut spawned = spawn(&engine, SpeechSettings::default());

        spawned.client.request_exit().unwrap();
        assert_eq!(spawned.events.wait_next(), None);
        spawned.worker.join().unwrap();

        assert!(matches!(
            spawned.client.submit("too late"),
            Err(SpeechError::WorkerUnavailable)
        ));
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        let text: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(text.as_ref()), "static message");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(owned.as_ref()), "owned message");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "speech engine panicked");
    }
}
