//! Application state for the TUI.
//!
//! `App` is the UI controller. It owns every widget value, hands text to the
//! speech worker through a [`SpeechClient`], and learns about progress only
//! from [`WorkerEvent`]s drained on the UI thread.

use talkbox_lib::{
    SpeechClient, SpeechOutcome, SpeechRate, SpeechSettings, SubmitOutcome, VoiceDescriptor,
    WorkerEvent, WorkerEvents, find_voice_by_name,
};
use tracing::{debug, error, warn};

use super::text_box::TextBox;
use super::voice_picker::VoicePicker;

/// Slider step for Left/Right.
pub const RATE_STEP: u32 = 5;
/// Slider step for PageUp/PageDown.
pub const RATE_PAGE_STEP: u32 = 25;

/// Application mode determining keyboard behavior and UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Normal mode - editing and the main controls.
    #[default]
    Normal,
    /// The voice dropdown is open.
    VoicePicker,
}

/// The control that receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Text,
    Voice,
    Rate,
    Speak,
    Stop,
    Clear,
}

impl Focus {
    const ORDER: [Focus; 6] = [
        Focus::Text,
        Focus::Voice,
        Focus::Rate,
        Focus::Speak,
        Focus::Stop,
        Focus::Clear,
    ];

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0)
    }

    /// The next control in tab order (wraps around).
    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    /// The previous control in tab order (wraps around).
    pub fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// Enabled state of the Speak and Stop buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buttons {
    pub speak_enabled: bool,
    pub stop_enabled: bool,
}

impl Buttons {
    fn for_speaking(is_speaking: bool) -> Self {
        Self {
            speak_enabled: !is_speaking,
            stop_enabled: is_speaking,
        }
    }
}

/// TUI application state.
pub struct App {
    /// The text to speak.
    pub text_box: TextBox,
    /// Voices offered by the engine at startup.
    pub voices: Vec<VoiceDescriptor>,
    /// Index into `voices` of the dropdown selection.
    pub selected_voice: Option<usize>,
    /// Slider value.
    pub rate: SpeechRate,
    /// Advisory speaking flag; drives the buttons only.
    pub is_speaking: bool,
    /// Which of Speak and Stop can be pressed.
    pub buttons: Buttons,
    /// The control receiving keys.
    pub focus: Focus,
    /// Current application mode.
    pub mode: AppMode,
    /// Voice picker state (present when VoicePicker mode is active).
    pub voice_picker: Option<VoicePicker>,
    /// How the last utterance ended, for the footer.
    pub last_outcome: Option<SpeechOutcome>,
    /// Flag indicating the application should exit.
    pub should_quit: bool,
    settings: SpeechSettings,
    client: SpeechClient,
    events: WorkerEvents,
    exit_requested: bool,
}

impl App {
    /// Creates the controller for a freshly spawned worker.
    ///
    /// The voice named in `settings` is selected if the engine offers it,
    /// otherwise the first voice. The resolved selection is written back to
    /// `settings` so the worker speaks with what the dropdown shows.
    pub fn new(
        client: SpeechClient,
        events: WorkerEvents,
        voices: Vec<VoiceDescriptor>,
        settings: SpeechSettings,
    ) -> Self {
        let initial = settings.snapshot();

        let selected_voice = initial
            .voice_name
            .as_deref()
            .and_then(|name| {
                let found = find_voice_by_name(&voices, name)
                    .and_then(|voice| voices.iter().position(|v| v.id == voice.id));
                if found.is_none() {
                    warn!(voice = name, "requested voice not offered; using the first voice");
                }
                found
            })
            .or(if voices.is_empty() { None } else { Some(0) });

        let mut app = Self {
            text_box: TextBox::new(),
            voices,
            selected_voice: None,
            rate: initial.rate,
            is_speaking: false,
            buttons: Buttons::for_speaking(false),
            focus: Focus::default(),
            mode: AppMode::Normal,
            voice_picker: None,
            last_outcome: None,
            should_quit: false,
            settings,
            client,
            events,
            exit_requested: false,
        };
        app.apply_voice(selected_voice);
        app
    }

    /// The voice shown in the dropdown, if any.
    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        self.selected_voice.and_then(|i| self.voices.get(i))
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Hands the trimmed text to the worker.
    ///
    /// Buttons are left alone; they flip when the worker reports `Started`.
    pub fn start_speaking(&mut self) {
        if self.is_speaking {
            return;
        }

        match self.client.submit(self.text_box.text()) {
            Ok(SubmitOutcome::Queued) => debug!("utterance queued"),
            Ok(SubmitOutcome::Empty) => debug!("nothing to speak"),
            Ok(SubmitOutcome::Busy) => debug!("speak ignored; utterance already in flight"),
            Err(e) => error!(error = %e, "could not hand utterance to speech worker"),
        }
    }

    /// Interrupts the current utterance and resets the buttons right away.
    pub fn stop_speaking(&mut self) {
        if !self.is_speaking {
            return;
        }

        self.client.stop();
        self.is_speaking = false;
        self.update_buttons(false);
    }

    /// Speak is enabled iff not speaking; Stop iff speaking.
    pub fn update_buttons(&mut self, is_speaking: bool) {
        self.buttons = Buttons::for_speaking(is_speaking);
    }

    /// Empties the text box. Speech in progress is unaffected.
    pub fn clear_text(&mut self) {
        self.text_box.clear();
    }

    /// Stops speech, sends the exit sentinel and marks the window for
    /// teardown. Calling it again only re-marks the window.
    pub fn shutdown(&mut self) {
        self.stop_speaking();

        if !self.exit_requested {
            if let Err(e) = self.client.request_exit() {
                warn!(error = %e, "speech worker already gone at shutdown");
            }
            self.exit_requested = true;
        }

        self.should_quit = true;
    }

    /// Applies every status update the worker has posted since the last tick.
    pub fn drain_worker_events(&mut self) {
        for event in self.events.drain() {
            self.handle_worker_event(event);
        }
    }

    /// Handles one status update from the worker.
    pub fn handle_worker_event(&mut self, event: WorkerEvent) {
        debug!(?event, "worker event");
        match event {
            WorkerEvent::Started => {
                self.is_speaking = true;
                self.update_buttons(true);
            }
            WorkerEvent::Finished(outcome) => {
                self.is_speaking = false;
                self.update_buttons(false);
                self.last_outcome = Some(outcome);
            }
        }
    }

    /// Activates the focused button, or opens the dropdown when it has focus.
    pub fn activate_focused(&mut self) {
        match self.focus {
            Focus::Speak => self.start_speaking(),
            Focus::Stop => self.stop_speaking(),
            Focus::Clear => self.clear_text(),
            Focus::Voice => self.open_voice_picker(),
            Focus::Text | Focus::Rate => {}
        }
    }

    // =========================================================================
    // Voice dropdown
    // =========================================================================

    /// Selects the next voice (wraps around).
    pub fn select_next_voice(&mut self) {
        if self.voices.is_empty() {
            return;
        }
        let next = self
            .selected_voice
            .map_or(0, |i| (i + 1) % self.voices.len());
        self.apply_voice(Some(next));
    }

    /// Selects the previous voice (wraps around).
    pub fn select_previous_voice(&mut self) {
        if self.voices.is_empty() {
            return;
        }
        let len = self.voices.len();
        let previous = self.selected_voice.map_or(0, |i| (i + len - 1) % len);
        self.apply_voice(Some(previous));
    }

    pub fn open_voice_picker(&mut self) {
        if self.voices.is_empty() {
            return;
        }
        self.voice_picker = Some(VoicePicker::new(self.voices.clone(), self.selected_voice));
        self.mode = AppMode::VoicePicker;
    }

    pub fn close_voice_picker(&mut self) {
        self.voice_picker = None;
        self.mode = AppMode::Normal;
    }

    /// Takes the highlighted picker entry as the new selection.
    pub fn confirm_voice_picker(&mut self) {
        let chosen = self.voice_picker.as_ref().and_then(VoicePicker::chosen);
        if let Some(index) = chosen {
            self.apply_voice(Some(index));
        }
        self.close_voice_picker();
    }

    fn apply_voice(&mut self, index: Option<usize>) {
        self.selected_voice = index.filter(|i| *i < self.voices.len());
        let name = self.selected_voice().map(|voice| voice.name.clone());
        debug!(voice = ?name, "voice selected");
        self.settings.set_voice_name(name);
    }

    // =========================================================================
    // Rate slider
    // =========================================================================

    pub fn increase_rate(&mut self, step: u32) {
        self.set_rate(self.rate.increased_by(step));
    }

    pub fn decrease_rate(&mut self, step: u32) {
        self.set_rate(self.rate.decreased_by(step));
    }

    pub fn set_rate(&mut self, rate: SpeechRate) {
        self.rate = rate;
        self.settings.set_rate(rate);
    }

    /// Blocks until the worker posts its next event and applies it.
    #[cfg(test)]
    pub fn wait_for_worker(&mut self) -> Option<WorkerEvent> {
        let event = self.events.wait_next()?;
        self.handle_worker_event(event.clone());
        Some(event)
    }

    #[cfg(test)]
    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> talkbox_lib::InFlightState {
        self.client.in_flight()
    }
}

/// Spawns a worker over a recording engine and wraps it in an `App`.
#[cfg(test)]
pub fn test_app(
    engine: &talkbox_lib::testing::RecordingEngine,
    voice: Option<&str>,
    rate: u32,
) -> (App, talkbox_lib::SpeechWorker) {
    use talkbox_lib::{SpeechParameters, SpeechWorker};

    let settings = SpeechSettings::new(SpeechParameters {
        voice_name: voice.map(str::to_string),
        rate: SpeechRate::new(rate),
    });
    let engine = engine.clone();
    let spawned = SpeechWorker::spawn(move || Ok(engine), settings.clone()).unwrap();
    let app = App::new(spawned.client, spawned.events, spawned.voices, settings);
    (app, spawned.worker)
}
