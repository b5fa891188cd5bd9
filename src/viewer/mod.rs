//! Terminal list viewer
//!
//! Layout:
//!   col 0..gutter_cols : entry index of the first row of each entry
//!   col gutter_cols..  : content rows of the bound window
//!   row term_rows-1    : status bar (window range, spacer, pool counts)
//!
//! The viewer is the host of a [`ListController`]: it turns key presses into
//! scroll offsets (in terminal rows), delivers them one at a time, and paints
//! whatever the controller currently has bound. It never measures entries
//! itself.
//!
//! Loads run on worker threads (data sheet, fallback image art). Results are
//! drained at each poll cycle; a result is applied only if it belongs to the
//! most recent load, so a slow reload can never overwrite a newer one.

mod input;
mod state;
mod terminal;

use crossterm::{
    event::{self, Event},
    terminal as crossterm_terminal,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::controller::{ListConfig, ListController};
use crate::entry::Entry;
use crate::load::{LoadTicket, Loader};
use crate::renderer::RenderTemplate;
use crate::source::{DataSource, JsonFileSource};
use crate::watch::SheetWatcher;

use input::{Action, CountPrefix, map_key_event};
use state::{Layout, ViewState};

/// Run the terminal viewer on a JSON data sheet.
pub fn run(source: JsonFileSource, config: Config, watch: bool) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let (term_cols, term_rows) = crossterm_terminal::size()
        .map_err(|e| anyhow::anyhow!("failed to get terminal size: {e}"))?;

    let mut guard = terminal::RawGuard::enter()?;
    let mut layout = state::compute_layout(term_cols, term_rows);

    let mut template = RenderTemplate::new(
        layout.content_cols as usize,
        config.render.line_height,
    );
    let mut controller = ListController::new(
        ListConfig {
            viewport_extent: layout.content_rows as f64,
            spacing: config.spacing,
            backward_margin: config.backward_margin,
        },
        template.clone(),
    );

    // Fallback image art from disk replaces the built-in one; until it
    // arrives (or fails) the controller holds entries without binding them.
    let mut art_loader: Loader<String> = Loader::new();
    let mut art_ticket: Option<LoadTicket> = None;
    if let Some(path) = config.render.image_art.clone() {
        art_ticket = Some(controller.begin_template_load());
        art_loader.spawn(move || {
            std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))
        });
    }

    let mut entry_loader: Loader<Vec<Entry>> = Loader::new();
    let spawn_entry_load = |loader: &mut Loader<Vec<Entry>>| {
        let src = source.clone();
        loader.spawn(move || src.provide());
    };
    spawn_entry_load(&mut entry_loader);

    let mut watcher = if watch {
        match SheetWatcher::new(source.path(), config.viewer.watch_interval) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!("watch: disabled ({e})");
                None
            }
        }
    } else {
        None
    };

    let mut state = ViewState {
        y_offset: 0.0,
        filename: source.display_name().to_string(),
        loading: true,
    };
    let scroll_step = config.viewer.scroll_step as f64 * config.render.line_height;

    let mut prefix = CountPrefix::new();
    let mut flash_msg: Option<String> = None;
    let mut dirty = true;
    let mut last_render = Instant::now();

    loop {
        // Drain finished loads.
        if let Some(result) = art_loader.poll() {
            match (result, art_ticket.take()) {
                (Ok(art), Some(ticket)) => {
                    template = template.clone().with_image_art(&art);
                    controller.install_templates(ticket, template.clone());
                    let at = controller.last_offset();
                    state.y_offset = state::scroll_to(&mut controller, at);
                }
                (Err(e), _) => {
                    warn!("image art: {e:#}");
                    controller.cancel_template_load();
                    flash_msg = Some(format!("{e:#}"));
                }
                (Ok(_), None) => {}
            }
            dirty = true;
        }
        if let Some(result) = entry_loader.poll() {
            match result {
                Ok(entries) => {
                    info!("viewer: new session with {} entries", entries.len());
                    controller.fetch_data(entries);
                    state.y_offset = 0.0;
                }
                Err(e) => {
                    warn!("viewer: load failed: {e:#}");
                    flash_msg = Some(format!("{e:#}"));
                }
            }
            dirty = true;
        }
        if watcher.as_mut().is_some_and(|w| w.has_changed()) {
            info!("viewer: sheet changed, reloading");
            spawn_entry_load(&mut entry_loader);
            dirty = true;
        }
        let loading = entry_loader.is_pending() || art_loader.is_pending();
        if loading != state.loading {
            state.loading = loading;
            dirty = true;
        }

        let timeout = if dirty {
            config.viewer.frame_budget.saturating_sub(last_render.elapsed())
        } else if loading || watcher.is_some() {
            config.viewer.watch_interval
        } else {
            Duration::from_secs(86400)
        };

        if event::poll(timeout)? {
            let ev = event::read()?;
            debug!("event: {:?}", ev);

            let had_flash = flash_msg.is_some();
            flash_msg = None;

            match ev {
                Event::Key(key_event) => {
                    let half_page = (layout.content_rows as f64 / 2.0).floor().max(1.0);
                    let Some(action) = map_key_event(key_event, &mut prefix) else {
                        // Unknown key: reset accumulator
                        if prefix.is_active() || had_flash {
                            prefix.clear();
                            draw_status(&controller, &layout, &state, None, None)?;
                        }
                        continue;
                    };

                    let target = match action {
                        Action::Quit => break,
                        Action::CancelInput | Action::Digit => {
                            draw_status(&controller, &layout, &state, prefix.value(), None)?;
                            continue;
                        }
                        Action::Reload => {
                            info!("viewer: reload requested");
                            spawn_entry_load(&mut entry_loader);
                            dirty = true;
                            continue;
                        }
                        Action::ScrollDown(n) => state.y_offset + n as f64 * scroll_step,
                        Action::ScrollUp(n) => state.y_offset - n as f64 * scroll_step,
                        Action::HalfPageDown(n) => state.y_offset + n as f64 * half_page,
                        Action::HalfPageUp(n) => state.y_offset - n as f64 * half_page,
                        Action::JumpToTop => 0.0,
                        Action::JumpToBottom => f64::MAX,
                        Action::JumpToRow(n) => (n as f64 - 1.0).max(0.0),
                    };
                    let old = state.y_offset;
                    state.y_offset = state::scroll_to(&mut controller, target);
                    debug!(
                        "scroll: y_offset {old:.1} → {:.1} (window {:?})",
                        state.y_offset,
                        controller.window_range()
                    );
                    dirty = true;
                }

                Event::Resize(new_cols, new_rows) => {
                    debug!("resize: {new_cols}x{new_rows}, relayout");
                    layout = state::compute_layout(new_cols, new_rows);
                    template.width = layout.content_cols as usize;
                    controller.set_viewport_extent(layout.content_rows as f64);
                    controller.relayout(template.clone());
                    let at = controller.last_offset();
                    state.y_offset = state::scroll_to(&mut controller, at);
                    terminal::clear_screen()?;
                    dirty = true;
                }

                _ => {}
            }
            continue;
        }

        // poll timeout → frame budget elapsed, execute redraw
        if dirty {
            redraw(&controller, &layout, &state, prefix.value(), flash_msg.as_deref())?;
            dirty = false;
        }
        last_render = Instant::now();
    }

    guard.cleanup();
    Ok(())
}

fn redraw(
    controller: &ListController,
    layout: &Layout,
    state: &ViewState,
    prefix_value: Option<u32>,
    flash: Option<&str>,
) -> anyhow::Result<()> {
    let rows = state::compose_rows(
        controller,
        state.y_offset,
        layout.content_rows as usize,
        layout.content_cols as usize,
    );
    terminal::draw_rows(&rows, layout)?;
    draw_status(controller, layout, state, prefix_value, flash)
}

fn draw_status(
    controller: &ListController,
    layout: &Layout,
    state: &ViewState,
    prefix_value: Option<u32>,
    flash: Option<&str>,
) -> anyhow::Result<()> {
    let text = state::status_line(controller, state, prefix_value, flash);
    terminal::draw_status_bar(layout, &text)?;
    Ok(())
}
