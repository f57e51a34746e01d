//! Multi-line text box state.
//!
//! The cursor is a character index (not a byte index) so edits stay on
//! character boundaries for any UTF-8 input. Where the cursor is drawn is a
//! separate question: wide characters take two terminal cells.

use unicode_width::UnicodeWidthChar;

/// Editable text with a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBox {
    content: String,
    cursor: usize,
}

impl TextBox {
    /// Creates an empty text box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a text box holding `text` with the cursor at the end.
    #[cfg(test)]
    pub fn with_text(text: &str) -> Self {
        Self {
            content: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    /// The full contents, untrimmed.
    pub fn text(&self) -> &str {
        &self.content
    }

    /// Empties the box.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Deletes the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// Moves to the start of the current line.
    pub fn move_home(&mut self) {
        let (line, _) = self.cursor_position();
        self.cursor = self.line_starts()[line];
    }

    /// Moves to the end of the current line.
    pub fn move_end(&mut self) {
        let (line, _) = self.cursor_position();
        self.cursor = self.line_starts()[line] + self.line_len(line);
    }

    /// Moves one line up, keeping the column where the line is long enough.
    pub fn move_up(&mut self) {
        let (line, column) = self.cursor_position();
        if line > 0 {
            self.move_to(line - 1, column);
        }
    }

    /// Moves one line down, keeping the column where the line is long enough.
    pub fn move_down(&mut self) {
        let (line, column) = self.cursor_position();
        if line + 1 < self.line_starts().len() {
            self.move_to(line + 1, column);
        }
    }

    /// Zero-based `(line, column)` of the cursor, in characters.
    pub fn cursor_position(&self) -> (usize, usize) {
        let mut line = 0;
        let mut column = 0;
        for c in self.content.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        (line, column)
    }

    /// Zero-based `(line, column)` of the cursor, in terminal cells.
    pub fn cursor_cell_position(&self) -> (usize, usize) {
        let mut line = 0;
        let mut cells = 0;
        for c in self.content.chars().take(self.cursor) {
            if c == '\n' {
                line += 1;
                cells = 0;
            } else {
                cells += UnicodeWidthChar::width(c).unwrap_or(0);
            }
        }
        (line, cells)
    }

    fn move_to(&mut self, line: usize, column: usize) {
        self.cursor = self.line_starts()[line] + column.min(self.line_len(line));
    }

    /// Character index where each line begins.
    fn line_starts(&self) -> Vec<usize> {
        std::iter::once(0)
            .chain(
                self.content
                    .chars()
                    .enumerate()
                    .filter(|(_, c)| *c == '\n')
                    .map(|(i, _)| i + 1),
            )
            .collect()
    }

    fn line_len(&self, line: usize) -> usize {
        self.content
            .split('\n')
            .nth(line)
            .map_or(0, |text| text.chars().count())
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(byte, _)| byte)
    }
}
