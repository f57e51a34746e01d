//! Modal overlay infrastructure for the TUI.
//!
//! Modals are drawn centered over the main window: compute the area, clear
//! it, then draw the border and hand the inner area to the modal.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Clear},
};

use super::PANEL_BG;
use super::color_context::ColorContext;

/// A dialog drawn over the main window.
pub trait Modal {
    /// Render the modal content inside its border.
    fn render(&self, frame: &mut Frame, area: Rect, color_context: &ColorContext);

    /// Title displayed in the border.
    fn title(&self) -> &str;

    /// Desired width as a percentage of the window (0-100).
    fn width_percent(&self) -> u16 {
        60
    }

    /// Desired height as a percentage of the window (0-100).
    fn height_percent(&self) -> u16 {
        40
    }

    /// Minimum width in columns, capped at the window width.
    fn min_width(&self) -> u16 {
        0
    }

    /// Minimum height in rows, capped at the window height.
    fn min_height(&self) -> u16 {
        0
    }
}

/// Renders `modal` centered within `main_area`.
pub fn render_modal(
    frame: &mut Frame,
    modal: &impl Modal,
    main_area: Rect,
    color_context: &ColorContext,
) {
    let modal_area = centered_rect_with_min(
        modal.width_percent(),
        modal.height_percent(),
        modal.min_width(),
        modal.min_height(),
        main_area,
    );

    // Clear first so the window underneath does not bleed through.
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", modal.title()))
        .style(Style::default().bg(PANEL_BG));

    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    modal.render(frame, inner, color_context);
}

/// Centered rectangle sized to the larger of the percentage and the minimum,
/// never exceeding the parent.
fn centered_rect_with_min(
    percent_x: u16,
    percent_y: u16,
    min_width: u16,
    min_height: u16,
    area: Rect,
) -> Rect {
    let percent_width = (area.width as u32 * percent_x as u32 / 100) as u16;
    let percent_height = (area.height as u32 * percent_y as u32 / 100) as u16;

    let width = percent_width.max(min_width).min(area.width);
    let height = percent_height.max(min_height).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_percentage_of_parent() {
        let rect = centered_rect_with_min(60, 40, 0, 0, Rect::new(0, 0, 100, 50));
        assert_eq!((rect.width, rect.height), (60, 20));
        assert_eq!((rect.x, rect.y), (20, 15));
    }

    #[test]
    fn minimum_wins_over_small_percentage() {
        let rect = centered_rect_with_min(10, 10, 40, 20, Rect::new(0, 0, 80, 30));
        assert_eq!((rect.width, rect.height), (40, 20));
        assert_eq!((rect.x, rect.y), (20, 5));
    }

    #[test]
    fn minimum_is_capped_at_parent() {
        // A cramped terminal: 30 cols x 6 rows
        let rect = centered_rect_with_min(70, 70, 0, 10, Rect::new(0, 0, 30, 6));
        assert_eq!(rect.height, 6);
        assert_eq!(rect.y, 0);
    }

    #[test]
    fn respects_parent_offset() {
        let rect = centered_rect_with_min(50, 50, 0, 0, Rect::new(10, 4, 40, 20));
        assert_eq!((rect.x, rect.y), (20, 9));
    }

    #[test]
    fn modal_trait_defaults() {
        struct Plain;
        impl Modal for Plain {
            fn render(&self, _frame: &mut Frame, _area: Rect, _color_context: &ColorContext) {}
            fn title(&self) -> &str {
                "Plain"
            }
        }

        assert_eq!(Plain.width_percent(), 60);
        assert_eq!(Plain.height_percent(), 40);
        assert_eq!(Plain.min_width(), 0);
        assert_eq!(Plain.min_height(), 0);
    }
}
