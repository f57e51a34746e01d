//! Event handling and main application loop.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;

use super::app::{App, AppMode, Focus, RATE_PAGE_STEP, RATE_STEP};
use super::render;

/// How long to wait for a key before draining worker events again.
const TICK: Duration = Duration::from_millis(50);

/// Runs the TUI application main loop.
///
/// Each tick renders the window, drains the worker's status channel and
/// waits up to [`TICK`] for keyboard input. Returns once the window has been
/// closed; the caller joins the worker afterwards.
///
/// ## Errors
///
/// Returns an I/O error if terminal operations fail.
pub fn run_app(terminal: &mut DefaultTerminal, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render::render(app, frame))?;

        app.drain_worker_events();

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
        {
            // Only handle Press events (Windows compatibility)
            if key.kind != KeyEventKind::Press {
                continue;
            }

            handle_input(app, key.code, key.modifiers);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Routes keyboard input to the appropriate mode handler.
fn handle_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
    match app.mode {
        AppMode::Normal => handle_normal_mode(app, key, modifiers),
        AppMode::VoicePicker => handle_voice_picker(app, key),
    }
}

/// Handles keyboard input in normal mode.
fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('s') => app.start_speaking(),
            KeyCode::Char('x') => app.stop_speaking(),
            KeyCode::Char('l') => app.clear_text(),
            KeyCode::Char('c') => app.shutdown(),
            _ => {}
        }
        return;
    }

    match key {
        KeyCode::Esc => app.shutdown(),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.previous(),
        _ => match app.focus {
            Focus::Text => handle_text_box(app, key),
            Focus::Voice => handle_voice_dropdown(app, key),
            Focus::Rate => handle_rate_slider(app, key),
            Focus::Speak | Focus::Stop | Focus::Clear => {
                if matches!(key, KeyCode::Enter | KeyCode::Char(' ')) {
                    app.activate_focused();
                }
            }
        },
    }
}

fn handle_text_box(app: &mut App, key: KeyCode) {
    let text_box = &mut app.text_box;
    match key {
        KeyCode::Char(c) => text_box.insert_char(c),
        KeyCode::Enter => text_box.insert_newline(),
        KeyCode::Backspace => text_box.backspace(),
        KeyCode::Delete => text_box.delete(),
        KeyCode::Left => text_box.move_left(),
        KeyCode::Right => text_box.move_right(),
        KeyCode::Up => text_box.move_up(),
        KeyCode::Down => text_box.move_down(),
        KeyCode::Home => text_box.move_home(),
        KeyCode::End => text_box.move_end(),
        _ => {}
    }
}

fn handle_voice_dropdown(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Left | KeyCode::Up => app.select_previous_voice(),
        KeyCode::Right | KeyCode::Down => app.select_next_voice(),
        KeyCode::Enter | KeyCode::Char(' ') => app.open_voice_picker(),
        _ => {}
    }
}

fn handle_rate_slider(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Left | KeyCode::Down => app.decrease_rate(RATE_STEP),
        KeyCode::Right | KeyCode::Up => app.increase_rate(RATE_STEP),
        KeyCode::PageDown => app.decrease_rate(RATE_PAGE_STEP),
        KeyCode::PageUp => app.increase_rate(RATE_PAGE_STEP),
        KeyCode::Home => app.decrease_rate(u32::MAX),
        KeyCode::End => app.increase_rate(u32::MAX),
        _ => {}
    }
}

/// Handles keyboard input while the voice picker is open.
fn handle_voice_picker(app: &mut App, key: KeyCode) {
    let Some(picker) = app.voice_picker.as_mut() else {
        app.mode = AppMode::Normal;
        return;
    };

    match key {
        KeyCode::Esc => app.close_voice_picker(),
        KeyCode::Enter => app.confirm_voice_picker(),
        KeyCode::Down => picker.select_next(),
        KeyCode::Up => picker.select_previous(),
        KeyCode::Backspace => picker.handle_backspace(),
        KeyCode::Char(c) => picker.handle_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::test_app;
    use talkbox_lib::testing::{EngineCall, RecordingEngine};
    use talkbox_lib::{MAX_RATE, MIN_RATE, SpeechOutcome, VoiceDescriptor, WorkerEvent};

    fn input(app: &mut App, key: KeyCode) {
        handle_input(app, key, KeyModifiers::NONE);
    }

    fn ctrl(app: &mut App, c: char) {
        handle_input(app, KeyCode::Char(c), KeyModifiers::CONTROL);
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            input(app, KeyCode::Char(c));
        }
    }

    fn engine() -> RecordingEngine {
        RecordingEngine::with_voices(vec![
            VoiceDescriptor::new("v1", "Alice").with_language("en-US"),
            VoiceDescriptor::new("v2", "Bob").with_language("en-GB"),
            VoiceDescriptor::new("v3", "Chloé").with_language("fr-FR"),
        ])
    }

    #[test]
    fn typing_goes_to_text_box() {
        let (mut app, _worker) = test_app(&engine(), None, 175);

        type_str(&mut app, "Hi");
        input(&mut app, KeyCode::Enter);
        type_str(&mut app, "there");
        input(&mut app, KeyCode::Backspace);

        assert_eq!(app.text_box.text(), "Hi\nther");
    }

    #[test]
    fn tab_and_backtab_move_focus() {
        let (mut app, _worker) = test_app(&engine(), None, 175);

        input(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Voice);
        input(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Rate);
        input(&mut app, KeyCode::BackTab);
        input(&mut app, KeyCode::BackTab);
        input(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Clear);
    }

    #[test]
    fn ctrl_s_speaks_and_ctrl_x_stops() {
        let engine = engine();
        let (mut app, worker) = test_app(&engine, None, 175);
        engine.hold_speech();
        type_str(&mut app, "Hello");

        ctrl(&mut app, 's');
        assert_eq!(app.wait_for_worker(), Some(WorkerEvent::Started));

        ctrl(&mut app, 'x');
        assert!(!app.is_speaking);
        assert_eq!(
            app.wait_for_worker(),
            Some(WorkerEvent::Finished(SpeechOutcome::Stopped))
        );

        ctrl(&mut app, 'c');
        assert!(app.should_quit);
        worker.join().unwrap();
        assert!(engine.calls().contains(&EngineCall::Say("Hello".into())));
    }

    #[test]
    fn ctrl_l_clears_text() {
        let (mut app, _worker) = test_app(&engine(), None, 175);
        type_str(&mut app, "scratch");

        ctrl(&mut app, 'l');

        assert_eq!(app.text_box.text(), "");
    }

    #[test]
    fn esc_closes_window() {
        let (mut app, worker) = test_app(&engine(), None, 175);

        input(&mut app, KeyCode::Esc);

        assert!(app.should_quit);
        worker.join().unwrap();
    }

    #[test]
    fn focused_buttons_activate_with_enter_or_space() {
        let engine = engine();
        let (mut app, worker) = test_app(&engine, None, 175);
        type_str(&mut app, "Go");

        app.focus = Focus::Speak;
        input(&mut app, KeyCode::Enter);
        app.wait_for_worker();
        app.wait_for_worker();

        app.focus = Focus::Clear;
        input(&mut app, KeyCode::Char(' '));
        assert_eq!(app.text_box.text(), "");

        app.shutdown();
        worker.join().unwrap();
        assert!(engine.calls().contains(&EngineCall::Say("Go".into())));
    }

    #[test]
    fn rate_slider_keys() {
        let (mut app, _worker) = test_app(&engine(), None, 175);
        app.focus = Focus::Rate;

        input(&mut app, KeyCode::Right);
        assert_eq!(app.rate.wpm(), 180);
        input(&mut app, KeyCode::PageDown);
        assert_eq!(app.rate.wpm(), 155);
        input(&mut app, KeyCode::End);
        assert_eq!(app.rate.wpm(), MAX_RATE);
        input(&mut app, KeyCode::Home);
        assert_eq!(app.rate.wpm(), MIN_RATE);
    }

    #[test]
    fn voice_dropdown_cycles_with_arrows() {
        let (mut app, _worker) = test_app(&engine(), Some("Alice"), 175);
        app.focus = Focus::Voice;

        input(&mut app, KeyCode::Left);
        assert_eq!(app.selected_voice, Some(2));
        input(&mut app, KeyCode::Right);
        assert_eq!(app.selected_voice, Some(0));
    }

    #[test]
    fn voice_picker_filters_and_chooses() {
        let (mut app, _worker) = test_app(&engine(), Some("Alice"), 175);
        app.focus = Focus::Voice;

        input(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::VoicePicker);

        type_str(&mut app, "fr");
        input(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.selected_voice, Some(2));
    }

    #[test]
    fn voice_picker_escape_keeps_selection() {
        let (mut app, _worker) = test_app(&engine(), Some("Bob"), 175);
        app.focus = Focus::Voice;

        input(&mut app, KeyCode::Char(' '));
        input(&mut app, KeyCode::Down);
        input(&mut app, KeyCode::Esc);

        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.should_quit);
        assert_eq!(app.selected_voice, Some(1));
    }

    #[test]
    fn keys_on_focused_buttons_do_not_type() {
        let (mut app, _worker) = test_app(&engine(), None, 175);
        app.focus = Focus::Stop;

        type_str(&mut app, "abc");

        assert_eq!(app.text_box.text(), "");
    }
}
