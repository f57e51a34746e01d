//! Core data types shared by the UI controller and the speech worker.

use std::sync::{Arc, PoisonError, RwLock};

/// Slowest rate the UI offers, in words per minute.
pub const MIN_RATE: u32 = 50;
/// Fastest rate the UI offers, in words per minute.
pub const MAX_RATE: u32 = 300;
/// Rate selected at startup, in words per minute.
pub const DEFAULT_RATE: u32 = 175;

/// A single unit of text submitted for synthesis.
///
/// The text is always trimmed and never empty; use [`Utterance::from_input`]
/// to build one from raw text box contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
}

impl Utterance {
    /// Builds an utterance from raw input, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing is left to speak.
    ///
    /// ## Examples
    ///
    /// ```
    /// use talkbox_lib::Utterance;
    ///
    /// let utterance = Utterance::from_input("  Hello world.\n").unwrap();
    /// assert_eq!(utterance.text(), "Hello world.");
    /// assert!(Utterance::from_input(" \t\n").is_none());
    /// ```
    pub fn from_input(input: &str) -> Option<Self> {
        let text = input.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self {
                text: text.to_string(),
            })
        }
    }

    /// The trimmed text to speak.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A voice offered by the speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Engine-specific identifier passed back to the engine on selection.
    pub id: String,
    /// Human readable name shown in the voice dropdown.
    pub name: String,
    /// Language tag reported by the engine, when known.
    pub language: Option<String>,
}

impl VoiceDescriptor {
    /// Creates a voice descriptor without language information.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: None,
        }
    }

    /// Attaches a language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Finds the voice whose display name matches `name` exactly.
///
/// Names are matched against whatever list is passed in, so callers should
/// pass a freshly listed set of voices.
pub fn find_voice_by_name<'a>(
    voices: &'a [VoiceDescriptor],
    name: &str,
) -> Option<&'a VoiceDescriptor> {
    voices.iter().find(|voice| voice.name == name)
}

/// Speaking rate in words per minute, always within `[MIN_RATE, MAX_RATE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeechRate(u32);

impl SpeechRate {
    /// Creates a rate, clamping it into the supported range.
    ///
    /// ## Examples
    ///
    /// ```
    /// use talkbox_lib::SpeechRate;
    ///
    /// assert_eq!(SpeechRate::new(175).wpm(), 175);
    /// assert_eq!(SpeechRate::new(10).wpm(), 50);
    /// assert_eq!(SpeechRate::new(1_000).wpm(), 300);
    /// ```
    pub fn new(wpm: u32) -> Self {
        Self(wpm.clamp(MIN_RATE, MAX_RATE))
    }

    /// The rate in words per minute.
    pub fn wpm(self) -> u32 {
        self.0
    }

    /// Returns the rate raised by `step`, saturating at [`MAX_RATE`].
    pub fn increased_by(self, step: u32) -> Self {
        Self::new(self.0.saturating_add(step))
    }

    /// Returns the rate lowered by `step`, saturating at [`MIN_RATE`].
    pub fn decreased_by(self, step: u32) -> Self {
        Self::new(self.0.saturating_sub(step))
    }

    /// Position of the rate within the supported range, from 0.0 to 1.0.
    pub fn ratio(self) -> f64 {
        f64::from(self.0 - MIN_RATE) / f64::from(MAX_RATE - MIN_RATE)
    }
}

impl Default for SpeechRate {
    fn default() -> Self {
        Self(DEFAULT_RATE)
    }
}

/// The voice/rate pair applied when an utterance starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechParameters {
    /// Display name of the selected voice, if any voice is selected.
    pub voice_name: Option<String>,
    /// Selected speaking rate.
    pub rate: SpeechRate,
}

/// Live speech parameters shared between the UI thread and the worker.
///
/// The UI writes on every control change; the worker takes a copy at the
/// moment an utterance starts, so a queued request speaks with whatever the
/// controls show when it is picked up.
#[derive(Debug, Clone, Default)]
pub struct SpeechSettings {
    inner: Arc<RwLock<SpeechParameters>>,
}

impl SpeechSettings {
    /// Creates settings seeded with `initial`.
    pub fn new(initial: SpeechParameters) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Returns a copy of the current parameters.
    pub fn snapshot(&self) -> SpeechParameters {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the selected voice name.
    pub fn set_voice_name(&self, name: Option<String>) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .voice_name = name;
    }

    /// Replaces the selected rate.
    pub fn set_rate(&self, rate: SpeechRate) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rate = rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_trims_surrounding_whitespace() {
        let utterance = Utterance::from_input("\n  Hello world.  \n").unwrap();
        assert_eq!(utterance.text(), "Hello world.");
    }

    #[test]
    fn utterance_keeps_inner_whitespace() {
        let utterance = Utterance::from_input(" line one\n\nline two ").unwrap();
        assert_eq!(utterance.text(), "line one\n\nline two");
    }

    #[test]
    fn utterance_rejects_blank_input() {
        assert!(Utterance::from_input("").is_none());
        assert!(Utterance::from_input("   \t \n").is_none());
    }

    #[test]
    fn rate_clamps_into_range() {
        assert_eq!(SpeechRate::new(0).wpm(), MIN_RATE);
        assert_eq!(SpeechRate::new(MAX_RATE + 1).wpm(), MAX_RATE);
        assert_eq!(SpeechRate::default().wpm(), DEFAULT_RATE);
    }

    #[test]
    fn rate_steps_saturate_at_bounds() {
        assert_eq!(SpeechRate::new(295).increased_by(25).wpm(), MAX_RATE);
        assert_eq!(SpeechRate::new(60).decreased_by(25).wpm(), MIN_RATE);
        assert_eq!(SpeechRate::new(175).increased_by(5).wpm(), 180);
    }

    #[test]
    fn rate_ratio_spans_zero_to_one() {
        assert_eq!(SpeechRate::new(MIN_RATE).ratio(), 0.0);
        assert_eq!(SpeechRate::new(MAX_RATE).ratio(), 1.0);
        assert!((SpeechRate::new(175).ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn find_voice_matches_display_name_only() {
        let voices = vec![
            VoiceDescriptor::new("v1", "Alice"),
            VoiceDescriptor::new("v2", "Bob"),
        ];
        assert_eq!(find_voice_by_name(&voices, "Bob").unwrap().id, "v2");
        assert!(find_voice_by_name(&voices, "v1").is_none());
        assert!(find_voice_by_name(&[], "Alice").is_none());
    }

    #[test]
    fn settings_are_shared_between_clones() {
        let settings = SpeechSettings::default();
        let worker_view = settings.clone();

        settings.set_voice_name(Some("Alice".into()));
        settings.set_rate(SpeechRate::new(220));

        let snapshot = worker_view.snapshot();
        assert_eq!(snapshot.voice_name.as_deref(), Some("Alice"));
        assert_eq!(snapshot.rate.wpm(), 220);
    }
}
