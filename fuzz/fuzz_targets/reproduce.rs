use std::time::Instant;

use log::info;
use scrollpool::controller::{ListConfig, ListController};
use scrollpool::entry::parse_entries;
use scrollpool::renderer::RenderTemplate;

fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: reproduce <sheet.json> [offset...]");
        std::process::exit(1);
    });

    let json = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });

    let entries = match parse_entries(&json) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Parse error: {e}");
            std::process::exit(1);
        }
    };

    let offsets: Vec<f64> = std::env::args()
        .skip(2)
        .filter_map(|s| s.parse().ok())
        .collect();

    let iterations = std::env::var("ITERATIONS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1);

    eprintln!(
        "=== Input: {} ({} entries, {} offsets), {} iteration(s) ===",
        path,
        entries.len(),
        offsets.len(),
        iterations
    );

    let mut controller =
        ListController::new(ListConfig::default(), RenderTemplate::new(74, 1.0));

    for i in 0..iterations {
        let iter_start = Instant::now();
        controller.fetch_data(entries.clone());
        for &offset in &offsets {
            controller.on_scroll_offset_changed(offset);
        }
        let constructed: usize = controller.pool_stats().iter().map(|s| s.constructed).sum();
        info!(
            "iteration {i}: window {:?}, spacer {:.1}, constructed {constructed}",
            controller.window_range(),
            controller.spacer()
        );
        eprintln!("iteration {i}: {:.1}ms", iter_start.elapsed().as_secs_f64() * 1000.0);
    }
}
