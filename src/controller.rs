//! Virtualized list controller.
//!
//! Keeps a contiguous window of entries bound to pooled renderers and moves
//! that window as the scroll offset changes. Entries above the window that
//! have been recycled are represented by the spacer, a single leading extent
//! equal to their summed `height + spacing`.
//!
//! Coordinates are measured from the content origin along the scroll axis:
//!
//! ```text
//!   0 ─┬─ spacer (released entries 0..head)
//!      │
//!   spacer ─┬─ window[0]   (head)
//!           ├─ spacing
//!           ├─ window[1]
//!           ⋮
//!   content_extent ─ end of the last bound entry + spacing
//! ```
//!
//! The adjustment is asymmetric. Scrolling forward releases entries whose
//! trailing edge has passed above the viewport and appends at the tail.
//! Scrolling backward prepends earlier entries until the head sits at least
//! `backward_margin` viewports above the leading edge, then trims entries that
//! start below the viewport's trailing edge.

use std::collections::VecDeque;
use std::ops::Range;

use log::{debug, info, trace, warn};

use crate::axis::{Axis, ScrollDirection, Vertical};
use crate::entry::Entry;
use crate::load::{LoadGate, LoadTicket};
use crate::pool::{PoolStats, RendererHandle, RendererPool};
use crate::renderer::{RenderTemplate, Renderer};

/// Geometry parameters of a list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListConfig {
    /// Visible extent along the scroll axis.
    pub viewport_extent: f64,
    /// Gap between consecutive entries.
    pub spacing: f64,
    /// How far above the viewport, in viewports, backward scrolling prefetches.
    pub backward_margin: f64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            viewport_extent: 24.0,
            spacing: 1.0,
            backward_margin: 1.0,
        }
    }
}

/// A bound window element.
#[derive(Debug, Clone, Copy)]
struct WindowItem {
    index: usize,
    handle: RendererHandle,
    height: f64,
}

/// Position of a bound element, for hosts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub index: usize,
    pub handle: RendererHandle,
    /// Leading edge, measured from the content origin.
    pub top: f64,
    pub height: f64,
}

/// Whether renderer templates are available yet.
enum PoolState {
    /// No pool; the first `fetch_data` installs the default template.
    Unloaded,
    /// Waiting for `install_templates` with this ticket.
    Loading(LoadTicket),
    Ready(RendererPool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Unloaded,
    Loading,
    Ready,
}

pub struct ListController<A: Axis = Vertical> {
    axis: A,
    config: ListConfig,
    default_template: RenderTemplate,
    pool: PoolState,
    template_gate: LoadGate,
    entries: Vec<Entry>,
    window: VecDeque<WindowItem>,
    spacer: f64,
    last_offset: f64,
}

impl ListController<Vertical> {
    pub fn new(config: ListConfig, template: RenderTemplate) -> Self {
        Self::with_axis(Vertical, config, template)
    }
}

impl<A: Axis> ListController<A> {
    pub fn with_axis(axis: A, config: ListConfig, template: RenderTemplate) -> Self {
        Self {
            axis,
            config,
            default_template: template,
            pool: PoolState::Unloaded,
            template_gate: LoadGate::new(),
            entries: Vec::new(),
            window: VecDeque::new(),
            spacer: 0.0,
            last_offset: 0.0,
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Start a new session with `entries`, replacing any previous one.
    pub fn fetch_data(&mut self, entries: Vec<Entry>) {
        self.reset();
        self.entries = entries;
        info!(
            "controller: fetch_data ({} entries, viewport={})",
            self.entries.len(),
            self.config.viewport_extent
        );

        if let PoolState::Unloaded = self.pool {
            info!("controller: pool ready (default template)");
            self.pool = PoolState::Ready(RendererPool::new(self.default_template.clone()));
        }
        if let PoolState::Loading(ticket) = self.pool {
            debug!(
                "controller: templates loading (#{}), deferring initial fill",
                ticket.generation()
            );
            return;
        }
        self.fill_forward(0.0);
        debug!(
            "controller: initial window {:?} (extent={:.1})",
            self.window_range(),
            self.content_extent()
        );
    }

    /// Release every bound element and zero the scroll state.
    fn reset(&mut self) {
        if let PoolState::Ready(pool) = &mut self.pool {
            while let Some(item) = self.window.pop_back() {
                pool.release(item.handle);
            }
        }
        self.window.clear();
        self.spacer = 0.0;
        self.last_offset = 0.0;
    }

    /// React to a new scroll offset reported by the host.
    pub fn on_scroll_offset_changed(&mut self, raw: f64) {
        let new_offset = self.axis.position_from_offset(raw);
        let direction = self.axis.direction(self.last_offset, new_offset);
        let offset = self.axis.clamp(new_offset);
        self.adjust_window(direction, offset);
        self.last_offset = offset;
    }

    /// Change the viewport extent and refit the window at the current offset.
    pub fn set_viewport_extent(&mut self, extent: f64) {
        debug!(
            "controller: viewport {} → {}",
            self.config.viewport_extent, extent
        );
        self.config.viewport_extent = extent.max(0.0);
        let offset = self.last_offset;
        self.adjust_window(ScrollDirection::Forward, offset);
        self.adjust_window(ScrollDirection::Backward, offset);
    }

    /// Rebind the whole session with a new template, keeping the scroll offset.
    ///
    /// Heights change when the width changes, so the spacer cannot be reused.
    pub fn relayout(&mut self, template: RenderTemplate) {
        let offset = self.last_offset;
        self.default_template = template.clone();
        if let PoolState::Ready(pool) = &mut self.pool {
            pool.set_template(template);
        }
        let entries = std::mem::take(&mut self.entries);
        self.fetch_data(entries);
        if offset > 0.0 {
            self.on_scroll_offset_changed(offset);
        }
    }

    // -----------------------------------------------------------------------
    // Template loading
    // -----------------------------------------------------------------------

    /// Begin an asynchronous template load. Any earlier load becomes stale.
    pub fn begin_template_load(&mut self) -> LoadTicket {
        let ticket = self.template_gate.begin();
        if !matches!(self.pool, PoolState::Ready(_)) {
            self.pool = PoolState::Loading(ticket);
        }
        debug!("controller: template load #{} started", ticket.generation());
        ticket
    }

    /// Install templates produced by the load identified by `ticket`.
    ///
    /// Returns `false` and changes nothing if `ticket` is not the latest load.
    pub fn install_templates(&mut self, ticket: LoadTicket, template: RenderTemplate) -> bool {
        if !self.template_gate.accept(ticket) {
            warn!(
                "controller: ignoring stale template load #{}",
                ticket.generation()
            );
            return false;
        }
        info!("controller: templates installed (#{})", ticket.generation());

        if let PoolState::Ready(_) = self.pool {
            self.relayout(template);
            return true;
        }

        self.default_template = template;
        self.fill_deferred();
        true
    }

    /// Abandon the in-flight template load.
    ///
    /// Entries already handed to `fetch_data` are bound with the default
    /// template; with nothing to show the controller returns to `Unloaded`.
    pub fn cancel_template_load(&mut self) {
        self.template_gate.cancel();
        let PoolState::Loading(ticket) = self.pool else {
            return;
        };
        debug!("controller: template load #{} cancelled", ticket.generation());
        if self.entries.is_empty() {
            self.pool = PoolState::Unloaded;
            return;
        }
        info!("controller: pool ready (default template, load cancelled)");
        self.fill_deferred();
    }

    /// Build the pool from the default template and run the initial fill
    /// that `fetch_data` skipped while templates were loading.
    fn fill_deferred(&mut self) {
        self.pool = PoolState::Ready(RendererPool::new(self.default_template.clone()));
        let offset = self.last_offset;
        self.fill_forward(0.0);
        if offset > 0.0 {
            self.adjust_window(ScrollDirection::Forward, offset);
        }
    }

    pub fn pool_status(&self) -> PoolStatus {
        match self.pool {
            PoolState::Unloaded => PoolStatus::Unloaded,
            PoolState::Loading(_) => PoolStatus::Loading,
            PoolState::Ready(_) => PoolStatus::Ready,
        }
    }

    // -----------------------------------------------------------------------
    // Window adjustment
    // -----------------------------------------------------------------------

    fn adjust_window(&mut self, direction: ScrollDirection, offset: f64) {
        if !matches!(self.pool, PoolState::Ready(_)) || self.entries.is_empty() {
            return;
        }
        let before = self.window_range();
        match direction {
            ScrollDirection::Forward => {
                self.release_leading(offset);
                self.fill_forward(offset);
            }
            ScrollDirection::Backward => {
                self.fill_backward(offset);
                self.release_trailing(offset);
            }
        }
        let after = self.window_range();
        if before != after {
            debug!(
                "controller: {direction:?} offset={offset:.1} window {before:?} → {after:?} spacer={:.1}",
                self.spacer
            );
        }
    }

    /// Forward release phase: drop head elements scrolled above the viewport.
    fn release_leading(&mut self, offset: f64) {
        let last = self.entries.len().saturating_sub(1);
        while self.window.len() > 1 {
            let Some(head) = self.window.front().copied() else {
                break;
            };
            let trailing_edge = self.spacer + head.height;
            if trailing_edge >= offset || head.index >= last {
                break;
            }
            self.window.pop_front();
            self.spacer += head.height + self.config.spacing;
            trace!(
                "controller: release head {} (spacer={:.1})",
                head.index, self.spacer
            );
            self.release(head.handle);
        }
    }

    /// Forward fetch phase: append at the tail until the viewport is covered.
    fn fill_forward(&mut self, offset: f64) {
        loop {
            let next = match self.window.back() {
                Some(tail) => tail.index + 1,
                None => {
                    self.spacer = 0.0;
                    0
                }
            };
            if next >= self.entries.len()
                || self.content_extent() - offset >= self.config.viewport_extent
            {
                break;
            }
            let Some(item) = self.bind_new(next) else {
                break;
            };
            trace!("controller: append {} (height={:.1})", next, item.height);
            self.window.push_back(item);
            // Keep a long jump from holding every intermediate entry.
            self.release_leading(offset);
        }
    }

    /// Backward fetch phase: prepend at the head until the margin above the
    /// viewport is covered.
    fn fill_backward(&mut self, offset: f64) {
        let margin = self.config.backward_margin * self.config.viewport_extent;
        loop {
            let Some(head) = self.window.front() else {
                break;
            };
            if head.index == 0 || self.spacer <= offset - margin {
                break;
            }
            let prev = head.index - 1;
            let Some(item) = self.bind_new(prev) else {
                break;
            };
            self.window.push_front(item);
            self.spacer = if prev == 0 {
                0.0
            } else {
                (self.spacer - (item.height + self.config.spacing)).max(0.0)
            };
            trace!(
                "controller: prepend {} (height={:.1}, spacer={:.1})",
                prev, item.height, self.spacer
            );
            self.release_trailing(offset);
        }
    }

    /// Backward release phase: drop tail elements that start past the
    /// viewport's trailing edge.
    fn release_trailing(&mut self, offset: f64) {
        let trailing_edge = offset + self.config.viewport_extent;
        while self.window.len() > 1 {
            let Some(tail) = self.window.back().copied() else {
                break;
            };
            let tail_top = self.content_extent() - tail.height - self.config.spacing;
            if tail_top <= trailing_edge || tail.index == 0 {
                break;
            }
            self.window.pop_back();
            trace!("controller: release tail {}", tail.index);
            self.release(tail.handle);
        }
    }

    fn bind_new(&mut self, index: usize) -> Option<WindowItem> {
        let PoolState::Ready(pool) = &mut self.pool else {
            return None;
        };
        let entry = self.entries.get(index)?;
        let handle = pool.get(entry.variant);
        let height = pool.bind(handle, index, entry)?;
        Some(WindowItem {
            index,
            handle,
            height,
        })
    }

    fn release(&mut self, handle: RendererHandle) {
        if let PoolState::Ready(pool) = &mut self.pool {
            pool.release(handle);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Spacer plus every bound element with its trailing spacing.
    pub fn content_extent(&self) -> f64 {
        self.spacer
            + self
                .window
                .iter()
                .map(|item| item.height + self.config.spacing)
                .sum::<f64>()
    }

    /// Largest useful offset, known once the last entry is bound.
    pub fn max_offset(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return Some(0.0);
        }
        let tail = self.window.back()?;
        if tail.index + 1 < self.entries.len() {
            return None;
        }
        let end = self.content_extent() - self.config.spacing;
        Some((end - self.config.viewport_extent).max(0.0))
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Entry indices currently bound, as a half-open range.
    pub fn window_range(&self) -> Range<usize> {
        match (self.window.front(), self.window.back()) {
            (Some(head), Some(tail)) => head.index..tail.index + 1,
            _ => 0..0,
        }
    }

    pub fn window(&self) -> Vec<Placed> {
        let mut top = self.spacer;
        self.window
            .iter()
            .map(|item| {
                let placed = Placed {
                    index: item.index,
                    handle: item.handle,
                    top,
                    height: item.height,
                };
                top += item.height + self.config.spacing;
                placed
            })
            .collect()
    }

    pub fn renderer(&self, handle: RendererHandle) -> Option<&Renderer> {
        match &self.pool {
            PoolState::Ready(pool) => pool.renderer(handle),
            _ => None,
        }
    }

    pub fn pool_stats(&self) -> Vec<PoolStats> {
        match &self.pool {
            PoolState::Ready(pool) => pool.stats(),
            _ => Vec::new(),
        }
    }

    pub fn spacer(&self) -> f64 {
        self.spacer
    }

    pub fn last_offset(&self) -> f64 {
        self.last_offset
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
