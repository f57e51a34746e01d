//! TUI module for the talkbox window.
//!
//! The terminal plays the part of the desktop window: a text box, a voice
//! dropdown, a rate slider and the Speak/Stop/Clear buttons.

use ratatui::style::Color;

mod app;
mod color_context;
mod event;
mod modal;
mod render;
mod text_box;
mod voice_picker;

pub use app::App;
pub use event::run_app;

/// Background for the footer and modal panels.
pub const PANEL_BG: Color = Color::Rgb(30, 30, 40);

/// Title shown in the window border and the terminal title bar.
pub const WINDOW_TITLE: &str = "Text to Speech Converter";
