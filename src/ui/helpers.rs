use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::catalog::StoreError;
use crate::models::Song;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Flatten a store error to a single footer-sized line, digging into the
/// persistence chain when there is one.
pub(crate) fn surface_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Persistence(inner) => surface_error(inner),
        other => other.to_string(),
    }
}

/// Completeness badge for a catalog row: green check when nothing is missing,
/// otherwise the short names of the gaps in yellow.
pub(crate) fn completeness_span(song: &Song) -> Span<'static> {
    let missing = song.missing_fields();
    if missing.is_empty() {
        Span::styled("✓ 齊全", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            format!("缺 {}", missing.join("/")),
            Style::default().fg(Color::Yellow),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn surface_error_prefers_the_root_cause() {
        let err = anyhow!("disk full")
            .context("failed to write catalog file")
            .context("save failed");
        assert_eq!(surface_error(&err), "disk full");
    }

    #[test]
    fn store_errors_surface_without_the_variant_wrapper() {
        let err = StoreError::Validation("expected a JSON array of songs".to_string());
        assert_eq!(
            surface_store_error(&err),
            "invalid import payload: expected a JSON array of songs"
        );
    }
}
