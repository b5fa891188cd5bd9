//! Viewer state: layout, scroll position, frame composition.

use log::debug;

use crate::axis::Axis;
use crate::controller::ListController;
use crate::entry::Variant;
use crate::renderer::{Bind, truncate_to_width};

// ---------------------------------------------------------------------------
// Layout / ViewState
// ---------------------------------------------------------------------------

pub(super) struct Layout {
    pub gutter_cols: u16,  // entry index column
    pub content_col: u16,  // first content column (= gutter_cols)
    pub content_cols: u16, // content width (= term_cols - gutter_cols)
    pub content_rows: u16, // viewport height (= term_rows - 1)
    pub status_row: u16,   // status bar row (= term_rows - 1)
}

pub(super) struct ViewState {
    pub y_offset: f64,
    pub filename: String,
    pub loading: bool,
}

pub(super) fn compute_layout(term_cols: u16, term_rows: u16) -> Layout {
    let gutter_cols: u16 = 6;
    Layout {
        gutter_cols,
        content_col: gutter_cols,
        content_cols: term_cols.saturating_sub(gutter_cols).max(1),
        content_rows: term_rows.saturating_sub(1).max(1),
        status_row: term_rows.saturating_sub(1),
    }
}

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

/// Deliver `target` to the controller and settle on the offset it can show.
///
/// The total content height is unknown until the last entry has been bound,
/// so overshooting past the end is only detected after the move; the offset
/// is then pulled back to the end and delivered again.
pub(super) fn scroll_to<A: Axis>(controller: &mut ListController<A>, target: f64) -> f64 {
    controller.on_scroll_offset_changed(target);
    let reached = controller.last_offset();
    match controller.max_offset() {
        Some(max) if reached > max => {
            debug!("scroll: overshoot {reached:.1} → end {max:.1}");
            controller.on_scroll_offset_changed(max);
            max
        }
        _ => reached,
    }
}

// ---------------------------------------------------------------------------
// Frame composition
// ---------------------------------------------------------------------------

/// One terminal row of the content area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Row {
    /// Entry index label shown in the gutter (first row of each entry only).
    pub gutter: Option<usize>,
    pub text: String,
    pub variant: Option<Variant>,
}

/// Lay out the bound window into `rows` screen rows at `y_offset`.
///
/// Rows not covered by any bound element stay blank. Elements partially
/// scrolled off either edge are clipped.
pub(super) fn compose_rows<A: Axis>(
    controller: &ListController<A>,
    y_offset: f64,
    rows: usize,
    cols: usize,
) -> Vec<Row> {
    let mut screen = vec![
        Row {
            gutter: None,
            text: String::new(),
            variant: None,
        };
        rows
    ];

    for placed in controller.window() {
        let Some(renderer) = controller.renderer(placed.handle) else {
            continue;
        };
        let lines = renderer.lines();
        if lines.is_empty() {
            continue;
        }
        let line_h = placed.height / lines.len() as f64;
        for (i, line) in lines.iter().enumerate() {
            let y = (placed.top + i as f64 * line_h - y_offset).floor();
            if y < 0.0 || y >= rows as f64 {
                continue;
            }
            screen[y as usize] = Row {
                gutter: (i == 0).then_some(placed.index),
                text: truncate_to_width(line, cols),
                variant: Some(placed.handle.variant()),
            };
        }
    }
    screen
}

/// Status bar text: position, window, spacer and pool diagnostics.
pub(super) fn status_line<A: Axis>(
    controller: &ListController<A>,
    state: &ViewState,
    prefix_value: Option<u32>,
    flash: Option<&str>,
) -> String {
    let range = controller.window_range();
    let total = controller.entries().len();
    let window = if range.is_empty() {
        "-".to_string()
    } else {
        format!("{}-{}", range.start, range.end - 1)
    };
    let pool: Vec<String> = controller
        .pool_stats()
        .iter()
        .map(|s| format!("{}:{}/{}", s.variant, s.active, s.idle))
        .collect();

    let position = format!(
        "[{window}]/{total} spacer={:.0} y={:.0} pool {}",
        controller.spacer(),
        state.y_offset,
        pool.join(" ")
    );

    if state.loading {
        format!(" {} | loading... | {position}", state.filename)
    } else if let Some(msg) = flash {
        format!(" {} | {msg} | {position}", state.filename)
    } else if let Some(n) = prefix_value {
        format!(" {} | :{n}_ | {position}", state.filename)
    } else {
        format!(
            " {} | {position}  [j/k d/u g/G Ng r:reload q:quit]",
            state.filename
        )
    }
}
