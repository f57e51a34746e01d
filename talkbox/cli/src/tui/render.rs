//! Rendering functions for the TUI.
//!
//! The window stacks the text box, voice dropdown, rate slider and buttons
//! inside a titled border, with a shortcut footer underneath.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph},
};
use talkbox_lib::SpeechOutcome;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::app::{App, AppMode, Focus};
use super::color_context::ColorContext;
use super::modal::render_modal;
use super::{PANEL_BG, WINDOW_TITLE};

/// Renders the entire application UI.
pub fn render(app: &App, frame: &mut Frame) {
    // Create color context once for NO_COLOR-aware rendering
    let color_context = ColorContext::new();
    render_with(app, frame, &color_context);
}

fn render_with(app: &App, frame: &mut Frame, color_context: &ColorContext) {
    let chunks = Layout::vertical([
        Constraint::Min(10),   // Window
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let window = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {WINDOW_TITLE} "))
        .title_alignment(Alignment::Center);
    let inner = window.inner(chunks[0]);
    frame.render_widget(window, chunks[0]);

    let rows = Layout::vertical([
        Constraint::Length(1), // Text label
        Constraint::Min(3),    // Text box
        Constraint::Length(1), // Voice label
        Constraint::Length(3), // Voice dropdown
        Constraint::Length(1), // Rate label
        Constraint::Length(3), // Rate slider
        Constraint::Length(3), // Buttons
    ])
    .split(inner);

    frame.render_widget(label("Enter text to convert to speech:"), rows[0]);
    render_text_box(app, frame, rows[1], color_context);
    frame.render_widget(label("Select voice:"), rows[2]);
    render_voice_dropdown(app, frame, rows[3], color_context);
    frame.render_widget(label("Speech speed:"), rows[4]);
    render_rate_slider(app, frame, rows[5], color_context);
    render_buttons(app, frame, rows[6], color_context);
    render_footer(app, frame, chunks[1], color_context);

    if app.mode == AppMode::VoicePicker
        && let Some(picker) = app.voice_picker.as_ref()
    {
        render_modal(frame, picker, frame.area(), color_context);
    }
}

fn label(text: &str) -> Paragraph<'_> {
    Paragraph::new(text).style(Style::default().add_modifier(Modifier::BOLD))
}

/// Bordered block whose border turns yellow when focused.
fn control_block(focused: bool, color_context: &ColorContext) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL);
    match (focused, color_context.is_color_enabled()) {
        (true, true) => block.border_style(Style::default().fg(Color::Yellow)),
        (true, false) => block.title(" * "),
        (false, _) => block,
    }
}

fn render_text_box(app: &App, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
    let focused = app.focus == Focus::Text && app.mode == AppMode::Normal;
    let block = control_block(focused, color_context);
    let inner = block.inner(area);

    let (line, column) = app.text_box.cursor_cell_position();
    let (line, column) = (to_cells(line), to_cells(column));
    let (scroll_y, scroll_x) = scroll_offset(line, column, inner);

    let text = Paragraph::new(app.text_box.text())
        .block(block)
        .scroll((scroll_y, scroll_x));
    frame.render_widget(text, area);

    if focused && inner.width > 0 && inner.height > 0 {
        let x = inner.x + column.saturating_sub(scroll_x);
        let y = inner.y + line.saturating_sub(scroll_y);
        frame.set_cursor_position(Position::new(x, y));
    }
}

/// Saturating conversion from a text offset to terminal cells.
fn to_cells(offset: usize) -> u16 {
    u16::try_from(offset).unwrap_or(u16::MAX)
}

/// Rows and cell columns to scroll so the cursor stays inside `inner`.
fn scroll_offset(line: u16, column: u16, inner: Rect) -> (u16, u16) {
    let y = line.saturating_sub(inner.height.saturating_sub(1));
    let x = column.saturating_sub(inner.width.saturating_sub(1));
    (y, x)
}

fn render_voice_dropdown(app: &App, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
    let focused = app.focus == Focus::Voice;
    let text = match app.selected_voice() {
        Some(voice) => {
            let mut spans = vec![Span::raw(voice.name.clone())];
            if let Some(language) = &voice.language {
                spans.push(Span::styled(
                    format!("  {language}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::raw(format!("  [{}]", app.voices.len())));
            Line::from(spans)
        }
        None => Line::from(Span::styled(
            "(engine default)",
            Style::default().fg(Color::DarkGray),
        )),
    };

    let dropdown = Paragraph::new(text).block(
        control_block(focused, color_context).title_bottom(Line::from(" \u{25be} ").right_aligned()),
    );
    frame.render_widget(dropdown, area);
}

fn render_rate_slider(app: &App, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
    let focused = app.focus == Focus::Rate;
    let filled = if color_context.is_color_enabled() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let gauge = LineGauge::default()
        .block(control_block(focused, color_context))
        .filled_style(filled)
        .unfilled_style(Style::default().fg(Color::DarkGray))
        .label(format!("{:>3} wpm ", app.rate.wpm()))
        .ratio(app.rate.ratio());
    frame.render_widget(gauge, area);
}

fn render_buttons(app: &App, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
    let cells = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    let buttons = [
        ("Speak", app.buttons.speak_enabled, Focus::Speak),
        ("Stop", app.buttons.stop_enabled, Focus::Stop),
        ("Clear", true, Focus::Clear),
    ];

    for ((name, enabled, focus), cell) in buttons.into_iter().zip(cells.iter()) {
        let focused = app.focus == focus;
        let text = color_context.button_label(name, enabled, focused);
        let button = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(button_style(enabled, focused, color_context))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(button, *cell);
    }
}

fn button_style(enabled: bool, focused: bool, color_context: &ColorContext) -> Style {
    if !color_context.is_color_enabled() {
        return Style::default();
    }
    match (enabled, focused) {
        (false, _) => Style::default().fg(Color::DarkGray),
        (true, true) => Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default().add_modifier(Modifier::BOLD),
    }
}

type Shortcut = (&'static str, &'static str);

/// Normal mode shortcut sets, widest first.
const NORMAL_SHORTCUTS: [&[Shortcut]; 3] = [
    &[
        ("^S", "Speak"),
        ("^X", "Stop"),
        ("^L", "Clear"),
        ("Tab", "Focus"),
        ("Esc", "Quit"),
    ],
    &[("^S", "Speak"), ("^X", "Stop"), ("Esc", "Quit")],
    &[("Esc", "Quit")],
];

/// Cells taken by a rendered shortcut list.
fn shortcuts_width(shortcuts: &[Shortcut]) -> usize {
    shortcuts
        .iter()
        .map(|(key, desc)| key.width() + desc.width() + 4)
        .sum()
}

/// Returns the widest Normal mode shortcut set that fits in `width` cells.
///
/// The quit shortcut is in every set, so it stays visible as long as any
/// set fits.
fn get_normal_mode_shortcuts(width: u16) -> &'static [Shortcut] {
    NORMAL_SHORTCUTS
        .into_iter()
        .find(|set| shortcuts_width(set) <= usize::from(width))
        .unwrap_or(NORMAL_SHORTCUTS[NORMAL_SHORTCUTS.len() - 1])
}

/// Shortens `text` to at most `max_width` cells, ending with an ellipsis when
/// anything was cut.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let target_width = max_width.saturating_sub(1);
    let mut result = String::new();
    let mut current_width = 0;
    for c in text.chars() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if current_width + char_width > target_width {
            break;
        }
        result.push(c);
        current_width += char_width;
    }

    if max_width > 0 {
        result.push('\u{2026}');
    }
    result
}

/// Worker state, preceded by the last failure reason while idle.
///
/// The status takes at most half of `width`; the failure reason is truncated
/// to fit.
fn status_line(app: &App, width: u16, color_context: &ColorContext) -> Line<'static> {
    let indicator = color_context.speaking_indicator(app.is_speaking);
    let mut spans = Vec::new();

    if !app.is_speaking
        && let Some(SpeechOutcome::Failed(message)) = &app.last_outcome
    {
        const PREFIX: &str = "Failed: ";
        let budget = usize::from(width / 2);
        let room = budget.saturating_sub(PREFIX.len() + indicator.width() + 2);
        if room > 0 {
            spans.push(Span::styled(
                format!("{PREFIX}{}  ", truncate_to_width(message, room)),
                Style::default().fg(Color::Red),
            ));
        }
    }

    spans.push(Span::styled(
        indicator,
        status_style(app.is_speaking, color_context),
    ));
    Line::from(spans)
}

/// Renders the footer with shortcuts on the left and worker state on the right.
fn render_footer(app: &App, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(PANEL_BG));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let status = status_line(app, inner.width, color_context);
    let status_width = to_cells(status.width()).min(inner.width);
    let halves = Layout::horizontal([Constraint::Min(0), Constraint::Length(status_width)])
        .split(inner);

    let shortcuts: &[Shortcut] = match app.mode {
        AppMode::Normal => get_normal_mode_shortcuts(halves[0].width),
        AppMode::VoicePicker => &[("Enter", "Choose"), ("Esc", "Back")],
    };

    let spans: Vec<Span> = shortcuts
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!(" {key} "),
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" {desc} ")),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), halves[0]);
    frame.render_widget(
        Paragraph::new(status).alignment(Alignment::Right),
        halves[1],
    );
}

fn status_style(speaking: bool, color_context: &ColorContext) -> Style {
    if speaking && color_context.is_color_enabled() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}
