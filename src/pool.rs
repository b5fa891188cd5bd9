//! Renderer pool: a per-variant reuse cache of renderer instances.
//!
//! Instances live in an arena for the lifetime of the pool. Each one is either
//! attached to the visible container (active) or parked offscreen in its
//! variant's idle list. `get` and `release` move instances between the two;
//! nothing is ever evicted.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::entry::{Entry, Variant};
use crate::renderer::{Bind, RenderTemplate, Renderer};

/// Opaque reference to a pooled renderer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererHandle {
    id: usize,
    variant: Variant,
}

impl RendererHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }
}

/// Where an instance currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Active, attached to the visible container.
    Visible,
    /// Idle, parked in the offscreen holding area.
    Offscreen,
}

struct Slot {
    renderer: Renderer,
    attachment: Attachment,
}

/// Per-variant counters, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub variant: Variant,
    pub active: usize,
    pub idle: usize,
    pub constructed: usize,
}

pub struct RendererPool {
    slots: Vec<Slot>,
    idle: HashMap<Variant, Vec<usize>>,
    template: RenderTemplate,
}

impl RendererPool {
    pub fn new(template: RenderTemplate) -> Self {
        Self {
            slots: Vec::new(),
            idle: HashMap::new(),
            template,
        }
    }

    /// Replace the construction template. Idle and active instances pick it
    /// up on their next activation.
    pub fn set_template(&mut self, template: RenderTemplate) {
        debug!(
            "pool: template changed (width={}, line_height={})",
            template.width, template.line_height
        );
        self.template = template;
    }

    /// Hand out an instance of `variant`, reusing an idle one when possible.
    pub fn get(&mut self, variant: Variant) -> RendererHandle {
        let reused = self.idle.get_mut(&variant).and_then(Vec::pop);
        let id = match reused {
            Some(id) => {
                trace!("pool: reuse {variant} #{id}");
                id
            }
            None => {
                let id = self.slots.len();
                self.slots.push(Slot {
                    renderer: Renderer::new(variant, &self.template),
                    attachment: Attachment::Offscreen,
                });
                debug!("pool: construct {variant} #{id}");
                id
            }
        };
        self.activate(id);
        RendererHandle { id, variant }
    }

    /// Return an instance to its idle list. Unknown or already idle handles
    /// are ignored.
    pub fn release(&mut self, handle: RendererHandle) {
        let Some(slot) = self.slots.get_mut(handle.id) else {
            warn!("pool: release of unknown handle #{}", handle.id);
            return;
        };
        if slot.renderer.variant() != handle.variant {
            warn!(
                "pool: release of #{} as {} but instance is {}",
                handle.id,
                handle.variant,
                slot.renderer.variant()
            );
            return;
        }
        if slot.attachment == Attachment::Offscreen {
            warn!("pool: release of idle handle #{}", handle.id);
            return;
        }
        slot.attachment = Attachment::Offscreen;
        self.idle.entry(handle.variant).or_default().push(handle.id);
        trace!("pool: release {} #{}", handle.variant, handle.id);
    }

    fn activate(&mut self, id: usize) {
        let slot = &mut self.slots[id];
        slot.renderer.apply_template(&self.template);
        slot.attachment = Attachment::Visible;
    }

    /// Bind an active instance to an entry and return its rendered height.
    ///
    /// Returns `None` if the handle does not refer to an active instance.
    pub fn bind(&mut self, handle: RendererHandle, index: usize, entry: &Entry) -> Option<f64> {
        let slot = self.slots.get_mut(handle.id)?;
        if slot.attachment != Attachment::Visible {
            return None;
        }
        slot.renderer.bind(index, entry);
        Some(slot.renderer.height())
    }

    pub fn renderer(&self, handle: RendererHandle) -> Option<&Renderer> {
        self.slots.get(handle.id).map(|s| &s.renderer)
    }

    pub fn attachment(&self, handle: RendererHandle) -> Option<Attachment> {
        self.slots.get(handle.id).map(|s| s.attachment)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        Variant::ALL
            .iter()
            .map(|&variant| {
                let mut stats = PoolStats {
                    variant,
                    active: 0,
                    idle: 0,
                    constructed: 0,
                };
                for slot in self.slots.iter().filter(|s| s.renderer.variant() == variant) {
                    stats.constructed += 1;
                    match slot.attachment {
                        Attachment::Visible => stats.active += 1,
                        Attachment::Offscreen => stats.idle += 1,
                    }
                }
                stats
            })
            .collect()
    }

    pub fn stats_for(&self, variant: Variant) -> PoolStats {
        self.stats()
            .into_iter()
            .find(|s| s.variant == variant)
            .unwrap_or(PoolStats {
                variant,
                active: 0,
                idle: 0,
                constructed: 0,
            })
    }

    pub fn constructed(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> RendererPool {
        RendererPool::new(RenderTemplate::new(20, 1.0))
    }

    #[test]
    fn get_on_empty_pool_constructs_active_instance() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        assert_eq!(h.variant(), Variant::Text);
        assert_eq!(p.attachment(h), Some(Attachment::Visible));
        let s = p.stats_for(Variant::Text);
        assert_eq!((s.active, s.idle, s.constructed), (1, 0, 1));
    }

    #[test]
    fn release_then_get_reuses_same_instance() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        p.release(h);
        assert_eq!(p.attachment(h), Some(Attachment::Offscreen));
        let s = p.stats_for(Variant::Text);
        assert_eq!((s.active, s.idle), (0, 1));

        let again = p.get(Variant::Text);
        assert_eq!(again, h);
        assert_eq!(p.constructed(), 1);
    }

    #[test]
    fn variants_do_not_share_idle_lists() {
        let mut p = pool();
        let text = p.get(Variant::Text);
        p.release(text);
        let image = p.get(Variant::Image);
        assert_ne!(image.id(), text.id());
        assert_eq!(p.stats_for(Variant::Text).idle, 1);
        assert_eq!(p.stats_for(Variant::Image).active, 1);
    }

    #[test]
    fn double_release_is_noop() {
        let mut p = pool();
        let h = p.get(Variant::Image);
        p.release(h);
        p.release(h);
        let s = p.stats_for(Variant::Image);
        assert_eq!((s.active, s.idle, s.constructed), (0, 1, 1));
        // Only one idle entry, so two gets need one construction.
        let a = p.get(Variant::Image);
        let b = p.get(Variant::Image);
        assert_ne!(a, b);
        assert_eq!(p.constructed(), 2);
    }

    #[test]
    fn release_unknown_handle_is_noop() {
        let mut p = pool();
        p.release(RendererHandle {
            id: 42,
            variant: Variant::Text,
        });
        assert_eq!(p.constructed(), 0);
    }

    #[test]
    fn release_with_wrong_variant_is_noop() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        p.release(RendererHandle {
            id: h.id(),
            variant: Variant::Image,
        });
        assert_eq!(p.attachment(h), Some(Attachment::Visible));
    }

    #[test]
    fn bind_reports_height() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        let height = p.bind(h, 0, &Entry::text("one two three four five six"));
        assert_eq!(height, Some(2.0));
        assert_eq!(p.renderer(h).and_then(|r| r.index()), Some(0));
    }

    #[test]
    fn bind_idle_instance_is_rejected() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        p.release(h);
        assert_eq!(p.bind(h, 0, &Entry::text("x")), None);
    }

    #[test]
    fn template_change_applies_on_reactivation() {
        let mut p = pool();
        let h = p.get(Variant::Text);
        p.release(h);
        p.set_template(RenderTemplate::new(3, 1.0));
        let h = p.get(Variant::Text);
        assert_eq!(p.bind(h, 0, &Entry::text("abcdef")), Some(2.0));
    }
}
