//! Terminal I/O layer: raw mode, content rows, status bar.

use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{Layout, Row};
use crate::entry::Variant;

// ---------------------------------------------------------------------------
// RawGuard: restores raw mode / alternate screen on Drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Paint the content area: gutter with entry indices, then entry rows.
pub(super) fn draw_rows(rows: &[Row], layout: &Layout) -> io::Result<()> {
    let mut out = stdout();
    let gutter_w = layout.gutter_cols as usize;
    let content_w = layout.content_cols as usize;

    for (y, row) in rows.iter().enumerate() {
        out.queue(cursor::MoveTo(0, y as u16))?;
        let gutter = match row.gutter {
            Some(idx) => format!("{:>w$} ", idx, w = gutter_w.saturating_sub(1)),
            None => " ".repeat(gutter_w),
        };
        write!(out, "{}", gutter.dark_grey())?;

        out.queue(cursor::MoveTo(layout.content_col, y as u16))?;
        let padded = format!("{:<width$}", row.text, width = content_w);
        match row.variant {
            Some(Variant::Image) => write!(out, "{}", padded.cyan())?,
            _ => write!(out, "{}", padded)?,
        }
    }
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Clear the whole screen (after a resize leaves stale cells behind).
pub(super) fn clear_screen() -> io::Result<()> {
    let mut out = stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.flush()
}

/// Draw the status bar on the last terminal row.
pub(super) fn draw_status_bar(layout: &Layout, text: &str) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let total_cols = (layout.gutter_cols + layout.content_cols) as usize;
    let clipped: String = text.chars().take(total_cols).collect();
    let padded = format!("{:<width$}", clipped, width = total_cols);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "scrollpool viewer requires an interactive terminal.\n\
             \n\
             To inspect the window without a terminal, use: scrollpool dump <sheet.json>"
        );
    }
    Ok(())
}
