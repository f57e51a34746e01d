//! Host text-to-speech engine backed by the `tts` crate.
//!
//! Uses the platform's native synthesizer (Speech Dispatcher on Linux,
//! SAPI/WinRT on Windows, AVFoundation on macOS). Features a backend does not
//! support are skipped rather than reported as errors.

use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use tts::{Features, Tts, Voice};

use crate::engine::{SpeechEngine, StopToken};
use crate::error::SpeechError;
use crate::types::{DEFAULT_RATE, SpeechRate, VoiceDescriptor};

/// Delay before the first `is_speaking` check; backends report "not speaking"
/// until audio actually starts.
const STARTUP_GRACE: Duration = Duration::from_millis(100);

/// Interval between `is_speaking` / stop checks while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Speech engine that drives the host's native synthesizer.
pub struct SystemEngine {
    tts: Tts,
    features: Features,
    /// Voices from the most recent listing, used to map ids back to `Voice`.
    voices: Vec<Voice>,
}

impl SystemEngine {
    /// Connects to the host's default speech backend.
    ///
    /// ## Errors
    ///
    /// Returns [`SpeechError::EngineInit`] if no backend is available.
    pub fn new() -> Result<Self, SpeechError> {
        let tts = Tts::default().map_err(|e| SpeechError::EngineInit {
            message: e.to_string(),
        })?;
        let features = tts.supported_features();
        debug!(
            voice = features.voice,
            rate = features.rate,
            stop = features.stop,
            is_speaking = features.is_speaking,
            "connected to host speech backend"
        );

        Ok(Self {
            tts,
            features,
            voices: Vec::new(),
        })
    }

    /// Maps a words-per-minute rate onto the backend's native rate scale.
    fn native_rate(&self, rate: SpeechRate) -> f32 {
        scale_rate(
            rate,
            self.tts.min_rate(),
            self.tts.normal_rate(),
            self.tts.max_rate(),
        )
    }
}

/// Scales `rate` so that [`DEFAULT_RATE`] lands on `normal`, clamped to the
/// backend's `[min, max]`.
fn scale_rate(rate: SpeechRate, min: f32, normal: f32, max: f32) -> f32 {
    let factor = rate.wpm() as f32 / DEFAULT_RATE as f32;
    (normal * factor).clamp(min, max)
}

impl SpeechEngine for SystemEngine {
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>, SpeechError> {
        if !self.features.voice {
            debug!("backend does not support voice selection");
            return Ok(Vec::new());
        }

        self.voices = self
            .tts
            .voices()
            .map_err(|e| SpeechError::engine("list_voices", e))?;

        Ok(self
            .voices
            .iter()
            .map(|voice| {
                VoiceDescriptor::new(voice.id(), voice.name())
                    .with_language(voice.language().to_string())
            })
            .collect())
    }

    fn set_voice(&mut self, id: &str) -> Result<(), SpeechError> {
        let Some(voice) = self.voices.iter().find(|voice| voice.id() == id) else {
            warn!(id, "voice id not in the last listing; keeping current voice");
            return Ok(());
        };

        self.tts
            .set_voice(voice)
            .map_err(|e| SpeechError::engine("set_voice", e))
    }

    fn set_rate(&mut self, rate: SpeechRate) -> Result<(), SpeechError> {
        if !self.features.rate {
            debug!("backend does not support rate changes");
            return Ok(());
        }

        let native = self.native_rate(rate);
        debug!(wpm = rate.wpm(), native, "applying speech rate");
        self.tts
            .set_rate(native)
            .map(|_| ())
            .map_err(|e| SpeechError::engine("set_rate", e))
    }

    fn say(&mut self, text: &str) -> Result<(), SpeechError> {
        self.tts
            .speak(text, false)
            .map(|_| ())
            .map_err(|e| SpeechError::engine("say", e))
    }

    fn run_and_wait(&mut self, stop: &StopToken) -> Result<(), SpeechError> {
        if !self.features.is_speaking {
            warn!("backend cannot report speaking state; not waiting for audio");
            return Ok(());
        }

        thread::sleep(STARTUP_GRACE);
        loop {
            if stop.is_raised() {
                return self.stop();
            }

            let speaking = self
                .tts
                .is_speaking()
                .map_err(|e| SpeechError::engine("is_speaking", e))?;
            if !speaking {
                return Ok(());
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        if !self.features.stop {
            debug!("backend does not support stopping speech");
            return Ok(());
        }

        self.tts
            .stop()
            .map(|_| ())
            .map_err(|e| SpeechError::engine("stop", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_maps_to_normal() {
        let native = scale_rate(SpeechRate::default(), 0.1, 1.0, 10.0);
        assert!((native - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rate_scales_linearly_around_normal() {
        let native = scale_rate(SpeechRate::new(350 / 2), 0.0, 100.0, 400.0);
        assert!((native - 100.0).abs() < f32::EPSILON);

        let faster = scale_rate(SpeechRate::new(300), 0.0, 175.0, 500.0);
        assert!((faster - 300.0).abs() < 1e-3);
    }

    #[test]
    fn rate_is_clamped_to_backend_range() {
        assert_eq!(scale_rate(SpeechRate::new(300), 0.5, 1.0, 1.5), 1.5);
        assert_eq!(scale_rate(SpeechRate::new(50), 0.5, 1.0, 1.5), 0.5);
    }
}
