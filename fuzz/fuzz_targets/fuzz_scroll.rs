#![no_main]

use libfuzzer_sys::fuzz_target;
use scrollpool::controller::{ListConfig, ListController};
use scrollpool::entry::Entry;
use scrollpool::renderer::RenderTemplate;

/// Input layout:
///   byte 0      viewport extent (1..=64)
///   byte 1      spacing (0..=3)
///   byte 2      entry count
///   next count  one byte per entry: bit 0 = image, bits 1.. = text length
///   rest        little-endian u16 scroll offsets
fuzz_target!(|data: &[u8]| {
    let [viewport, spacing, count, rest @ ..] = data else {
        return;
    };
    let viewport = (*viewport % 64 + 1) as f64;
    let spacing = (*spacing % 4) as f64;
    let count = *count as usize;
    if rest.len() < count {
        return;
    }
    let (shape, offsets) = rest.split_at(count);

    let entries: Vec<Entry> = shape
        .iter()
        .map(|b| {
            if b & 1 == 1 {
                Entry::image("")
            } else {
                Entry::text("x ".repeat((b >> 1) as usize))
            }
        })
        .collect();

    let template = RenderTemplate::new(16, 1.0).with_image_art("##\n##\n##\n");
    let mut controller = ListController::new(
        ListConfig {
            viewport_extent: viewport,
            spacing,
            backward_margin: 1.0,
        },
        template,
    );
    controller.fetch_data(entries);

    for chunk in offsets.chunks_exact(2) {
        let offset = u16::from_le_bytes([chunk[0], chunk[1]]) as f64;
        controller.on_scroll_offset_changed(offset);

        let placed = controller.window();
        if count == 0 {
            assert!(placed.is_empty());
            continue;
        }
        assert!(!placed.is_empty(), "window emptied at offset {offset}");

        let range = controller.window_range();
        assert!(range.end <= count, "window {range:?} past {count} entries");
        for pair in placed.windows(2) {
            assert_eq!(pair[1].index, pair[0].index + 1, "window not contiguous");
        }
        if range.start == 0 {
            assert_eq!(controller.spacer(), 0.0);
        }
        if range.end < count {
            assert!(
                controller.content_extent() - offset >= viewport,
                "viewport uncovered at offset {offset}: window {range:?}"
            );
        }

        let active: usize = controller.pool_stats().iter().map(|s| s.active).sum();
        assert_eq!(active, placed.len(), "active instances outside the window");
    }
});
