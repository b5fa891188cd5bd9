#![no_main]

use libfuzzer_sys::fuzz_target;
use scrollpool::controller::{ListConfig, ListController};
use scrollpool::entry::parse_entries;
use scrollpool::renderer::{Bind, RenderTemplate};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };

    // Malformed sheets must be rejected, never panic.
    let Ok(entries) = parse_entries(json) else {
        return;
    };
    let n = entries.len();

    let mut controller = ListController::new(ListConfig::default(), RenderTemplate::new(20, 1.0));
    controller.fetch_data(entries);

    // Whatever the content, every bound entry has a non-empty rendering.
    for placed in controller.window() {
        assert!(placed.index < n);
        let renderer = controller
            .renderer(placed.handle)
            .expect("bound handle must resolve");
        assert!(placed.height > 0.0, "entry {} rendered empty", placed.index);
        assert!(!renderer.lines().is_empty());
    }
});

