//! Voice picker modal: the open state of the voice dropdown.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use talkbox_lib::VoiceDescriptor;

use super::color_context::ColorContext;
use super::modal::Modal;

/// Filterable list of voices.
pub struct VoicePicker {
    /// Every voice, in engine order.
    pub voices: Vec<VoiceDescriptor>,
    pub list_state: ListState,
    pub filter: String,
}

impl VoicePicker {
    /// Opens the picker with `current` (an index into `voices`) highlighted.
    pub fn new(voices: Vec<VoiceDescriptor>, current: Option<usize>) -> Self {
        let mut list_state = ListState::default();
        if !voices.is_empty() {
            list_state.select(Some(current.unwrap_or(0).min(voices.len() - 1)));
        }

        Self {
            voices,
            list_state,
            filter: String::new(),
        }
    }

    /// Indices into `voices` that match the filter (case-insensitive, on name
    /// or language).
    pub fn filtered_indices(&self) -> Vec<usize> {
        let filter = self.filter.to_lowercase();
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, voice)| {
                filter.is_empty()
                    || voice.name.to_lowercase().contains(&filter)
                    || voice
                        .language
                        .as_deref()
                        .is_some_and(|language| language.to_lowercase().contains(&filter))
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub fn select_next(&mut self) {
        let count = self.filtered_indices().len();
        if count == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some((current + 1) % count));
    }

    pub fn select_previous(&mut self) {
        let count = self.filtered_indices().len();
        if count == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        let previous = if current == 0 { count - 1 } else { current - 1 };
        self.list_state.select(Some(previous));
    }

    /// Index into `voices` of the highlighted entry.
    pub fn chosen(&self) -> Option<usize> {
        let filtered = self.filtered_indices();
        self.list_state
            .selected()
            .and_then(|i| filtered.get(i).copied())
    }

    pub fn handle_char(&mut self, c: char) {
        self.filter.push(c);
        self.reset_selection();
    }

    pub fn handle_backspace(&mut self) {
        self.filter.pop();
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        if self.filtered_indices().is_empty() {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(0));
        }
    }
}

impl Modal for VoicePicker {
    fn title(&self) -> &str {
        "Select voice"
    }

    fn width_percent(&self) -> u16 {
        70
    }

    fn height_percent(&self) -> u16 {
        70
    }

    fn min_height(&self) -> u16 {
        10
    }

    fn render(&self, frame: &mut Frame, area: Rect, color_context: &ColorContext) {
        let chunks = Layout::vertical([
            Constraint::Length(3), // Filter
            Constraint::Min(3),    // List
            Constraint::Length(1), // Help
        ])
        .split(area);

        let filter_text = if self.filter.is_empty() {
            "Type to filter".to_string()
        } else {
            format!("Filter: {}|", self.filter)
        };
        let filter_style = if self.filter.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let filter = Paragraph::new(filter_text).style(filter_style).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search ")
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(filter, chunks[0]);

        let items: Vec<ListItem> = self
            .filtered_indices()
            .into_iter()
            .map(|index| {
                let voice = &self.voices[index];
                let mut spans = vec![Span::raw(voice.name.clone())];
                if let Some(language) = &voice.language {
                    spans.push(Span::styled(
                        format!("  {language}"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(color_context.selection_marker());

        // ListState needs &mut for scrolling; render from a copy.
        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, chunks[1], &mut state);

        let help = Paragraph::new("\u{2191}\u{2193}: Move | Enter: Choose | Esc: Cancel")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(help, chunks[2]);
    }
}
