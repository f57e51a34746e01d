//! Color context management for NO_COLOR support.
//!
//! Focus and disabled states are shown with color when it is available. When
//! `NO_COLOR` is set to a non-empty value (see [no-color.org](https://no-color.org))
//! the same states are spelled out with text markers instead.

use std::env;

/// Context for color-aware rendering decisions.
///
/// Created once per frame and passed through to render functions.
#[derive(Debug, Clone, Copy)]
pub struct ColorContext {
    color_enabled: bool,
}

impl ColorContext {
    /// Creates a new `ColorContext` by detecting the `NO_COLOR` environment variable.
    pub fn new() -> Self {
        Self {
            color_enabled: Self::detect_color_enabled(),
        }
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self {
            color_enabled: true,
        }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self {
            color_enabled: false,
        }
    }

    /// Returns `true` if color output is enabled.
    pub fn is_color_enabled(&self) -> bool {
        self.color_enabled
    }

    /// Text shown inside a button.
    ///
    /// With color, the label is padded and styling carries focus and
    /// enablement. Without color:
    /// - disabled buttons are wrapped in parentheses: `(Stop)`
    /// - the focused button is wrapped in arrows: `> Speak <`
    pub fn button_label(&self, label: &str, enabled: bool, focused: bool) -> String {
        if self.color_enabled {
            return format!(" {label} ");
        }

        let inner = if enabled {
            label.to_string()
        } else {
            format!("({label})")
        };
        if focused {
            format!("> {inner} <")
        } else {
            format!("  {inner}  ")
        }
    }

    /// Marker in front of the highlighted list entry.
    pub fn selection_marker(&self) -> &'static str {
        if self.color_enabled {
            "\u{25b6} " // ▶
        } else {
            "> "
        }
    }

    /// Footer indicator for the worker state.
    pub fn speaking_indicator(&self, speaking: bool) -> &'static str {
        match (self.color_enabled, speaking) {
            (true, true) => "\u{25cf} Speaking", // ●
            (true, false) => "\u{25cb} Idle",    // ○
            (false, true) => "[SPEAKING]",
            (false, false) => "[IDLE]",
        }
    }

    /// Per the no-color.org spec:
    /// - If NO_COLOR is unset, color is enabled
    /// - If NO_COLOR is set but empty, color is enabled
    /// - If NO_COLOR is set to any non-empty value, color is disabled
    fn detect_color_enabled() -> bool {
        match env::var("NO_COLOR") {
            Ok(value) => value.is_empty(),
            Err(env::VarError::NotPresent) => true,
            Err(env::VarError::NotUnicode(_)) => false, // Treat invalid UTF-8 as "set"
        }
    }
}

impl Default for ColorContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Runs `f` with NO_COLOR set to `value` (or removed), then restores it.
    fn with_no_color<F, R>(value: Option<&str>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("NO_COLOR").ok();

        // SAFETY: Tests are serialized by ENV_LOCK mutex, preventing data races.
        unsafe {
            match value {
                Some(v) => env::set_var("NO_COLOR", v),
                None => env::remove_var("NO_COLOR"),
            }
        }

        let result = f();

        // SAFETY: Same as above - serialized by mutex
        unsafe {
            match original {
                Some(v) => env::set_var("NO_COLOR", v),
                None => env::remove_var("NO_COLOR"),
            }
        }

        result
    }

    #[test]
    fn color_enabled_when_no_color_unset() {
        with_no_color(None, || assert!(ColorContext::new().is_color_enabled()));
    }

    #[test]
    fn color_enabled_when_no_color_is_empty() {
        with_no_color(Some(""), || assert!(ColorContext::new().is_color_enabled()));
    }

    #[test]
    fn color_disabled_when_no_color_set_to_any_value() {
        for value in ["1", "0", "yes"] {
            with_no_color(Some(value), || {
                assert!(
                    !ColorContext::new().is_color_enabled(),
                    "NO_COLOR={value} should disable color"
                );
            });
        }
    }

    #[test]
    fn colored_button_label_is_padded_only() {
        let ctx = ColorContext::with_color();
        assert_eq!(ctx.button_label("Speak", true, true), " Speak ");
        assert_eq!(ctx.button_label("Stop", false, false), " Stop ");
    }

    #[test]
    fn plain_button_label_marks_disabled_and_focus() {
        let ctx = ColorContext::without_color();
        assert_eq!(ctx.button_label("Speak", true, true), "> Speak <");
        assert_eq!(ctx.button_label("Stop", false, false), "  (Stop)  ");
        assert_eq!(ctx.button_label("Stop", false, true), "> (Stop) <");
    }

    #[test]
    fn indicators_fall_back_to_ascii() {
        let ctx = ColorContext::without_color();
        assert_eq!(ctx.selection_marker(), "> ");
        assert_eq!(ctx.speaking_indicator(true), "[SPEAKING]");
        assert_eq!(ctx.speaking_indicator(false), "[IDLE]");

        let ctx = ColorContext::with_color();
        assert_eq!(ctx.speaking_indicator(true), "\u{25cf} Speaking");
    }
}
