use std::io::Write;

use proptest::prelude::*;

use scrollpool::controller::{ListConfig, ListController, PoolStatus};
use scrollpool::entry::{Entry, Variant};
use scrollpool::load::Loader;
use scrollpool::renderer::{Bind, RenderTemplate, Renderer};
use scrollpool::source::{DataSource, JsonFileSource, Order, StaticSource};

const WIDTH: usize = 24;

fn template(art_rows: usize) -> RenderTemplate {
    RenderTemplate::new(WIDTH, 1.0).with_image_art(&"[img]\n".repeat(art_rows))
}

fn controller(viewport: f64, spacing: f64, art_rows: usize) -> ListController {
    ListController::new(
        ListConfig {
            viewport_extent: viewport,
            spacing,
            backward_margin: 1.0,
        },
        template(art_rows),
    )
}

/// Mixed sheet: every fifth entry is an image, every seventh text is empty,
/// the rest wrap to one to three rows.
fn mixed_entries(n: usize) -> Vec<Entry> {
    (0..n)
        .map(|i| {
            if i % 5 == 4 {
                Entry::image(format!("img/{i}.png"))
            } else if i % 7 == 6 {
                Entry::text("")
            } else {
                Entry::text("word ".repeat(1 + (i * 3) % 12))
            }
        })
        .collect()
}

/// Heights measured with standalone renderers, independent of any pool.
fn measured_heights(entries: &[Entry], template: &RenderTemplate) -> Vec<f64> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut r = Renderer::new(e.variant, template);
            r.bind(i, e);
            r.height()
        })
        .collect()
}

fn expected_spacer(heights: &[f64], head: usize, spacing: f64) -> f64 {
    heights[..head].iter().map(|h| h + spacing).sum()
}

fn total_active(c: &ListController) -> usize {
    c.pool_stats().iter().map(|s| s.active).sum()
}

fn total_constructed(c: &ListController) -> usize {
    c.pool_stats().iter().map(|s| s.constructed).sum()
}

fn write_sheet(json: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ---------------------------------------------------------------------------
// Scroll behavior
// ---------------------------------------------------------------------------

#[test]
fn three_entry_sheet_scrolls_onto_image() {
    let file = write_sheet(
        r#"[
            {"type": "Text", "content": "A"},
            {"type": "Text", "content": ""},
            {"type": "Image", "content": ""}
        ]"#,
    );
    let entries = JsonFileSource::new(file.path(), Order::AsStored)
        .provide()
        .unwrap();

    let mut c = controller(4.0, 1.0, 3);
    c.fetch_data(entries);
    assert_eq!(c.window_range(), 0..2);
    assert_eq!(c.spacer(), 0.0);

    let placed = c.window();
    let lines = c.renderer(placed[1].handle).unwrap().lines().to_vec();
    assert_eq!(lines, vec!["Fallback Text".to_string()]);

    c.on_scroll_offset_changed(1.5);
    assert_eq!(c.window_range(), 1..3);
    assert_eq!(c.spacer(), 2.0);
    let image = c.window()[1];
    assert_eq!(image.handle.variant(), Variant::Image);
    assert_eq!(image.top, 4.0);
    assert_eq!(image.height, 3.0);
}

#[test]
fn released_instance_comes_back_for_next_entry() {
    let mut c = controller(3.0, 0.0, 3);
    c.fetch_data(vec![
        Entry::text("a"),
        Entry::text("b"),
        Entry::text("c"),
        Entry::text("d"),
    ]);
    assert_eq!(c.window_range(), 0..3);
    let first = c.window()[0].handle;

    // Entry 0 scrolls out; its instance is the only idle Text renderer and
    // must be reused for entry 3.
    c.on_scroll_offset_changed(1.5);
    let placed = c.window();
    let last = placed.last().unwrap();
    assert_eq!(last.index, 3);
    assert_eq!(last.handle, first);
    assert_eq!(total_constructed(&c), 3);
}

#[test]
fn returning_to_top_restores_first_entry() {
    let mut c = controller(10.0, 1.0, 4);
    c.fetch_data(mixed_entries(200));
    for step in 0..60 {
        c.on_scroll_offset_changed(step as f64 * 7.0);
    }
    assert!(c.window_range().start > 0);
    assert!(c.spacer() > 0.0);

    c.on_scroll_offset_changed(0.0);
    assert_eq!(c.window_range().start, 0);
    assert_eq!(c.spacer(), 0.0);
    assert_eq!(c.window()[0].top, 0.0);
}

#[test]
fn scrolling_past_the_end_binds_last_entry() {
    let n = 150;
    let mut c = controller(12.0, 1.0, 5);
    c.fetch_data(mixed_entries(n));
    assert_eq!(c.max_offset(), None);

    c.on_scroll_offset_changed(1.0e9);
    assert_eq!(c.window_range().end, n);
    assert_eq!(c.window().last().unwrap().index, n - 1);

    let max = c.max_offset().unwrap();
    let heights = measured_heights(&mixed_entries(n), &template(5));
    let content = expected_spacer(&heights, n, 1.0) - 1.0;
    assert_eq!(max, content - 12.0);

    // Settling back to the real maximum keeps the tail in place.
    c.on_scroll_offset_changed(max);
    assert_eq!(c.window_range().end, n);
    assert!(c.content_extent() - max >= 12.0);
}

#[test]
fn refetch_of_same_sheet_is_idempotent() {
    let mut c = controller(9.0, 1.0, 3);
    c.fetch_data(mixed_entries(80));
    let first: Vec<_> = c.window().iter().map(|p| (p.index, p.top, p.height)).collect();
    let built = total_constructed(&c);

    c.on_scroll_offset_changed(40.0);
    c.fetch_data(mixed_entries(80));
    let second: Vec<_> = c.window().iter().map(|p| (p.index, p.top, p.height)).collect();

    assert_eq!(first, second);
    assert_eq!(c.spacer(), 0.0);
    assert!(total_constructed(&c) >= built);
    assert_eq!(total_active(&c), c.window_len());
}

#[test]
fn repeated_scroll_cycles_do_not_grow_pool() {
    let n = 1_000;
    let mut c = controller(15.0, 1.0, 6);
    c.fetch_data(mixed_entries(n));

    let cycle = |c: &mut ListController| {
        for step in 0..=400 {
            c.on_scroll_offset_changed(step as f64 * 5.0);
        }
        for step in (0..=400).rev() {
            c.on_scroll_offset_changed(step as f64 * 5.0);
        }
    };

    cycle(&mut c);
    cycle(&mut c);
    let after_two = total_constructed(&c);
    for _ in 0..5 {
        cycle(&mut c);
    }
    assert_eq!(total_constructed(&c), after_two);
    // Viewport 15 plus one viewport of backward margin never needs more
    // than a few dozen instances, regardless of sheet length.
    assert!(after_two < 40, "constructed {after_two}");
}

#[test]
fn long_jump_does_not_bind_intermediate_entries() {
    let mut c = controller(10.0, 1.0, 3);
    c.fetch_data(mixed_entries(5_000));
    c.on_scroll_offset_changed(20_000.0);
    assert!(c.window_range().start > 1_000);
    assert!(total_constructed(&c) < 30);
    assert_eq!(total_active(&c), c.window_len());
}

#[test]
fn spacer_matches_measured_heights() {
    let n = 300;
    let entries = mixed_entries(n);
    let heights = measured_heights(&entries, &template(4));
    let mut c = controller(8.0, 2.0, 4);
    c.fetch_data(entries);

    let offsets = [0.0, 13.0, 55.5, 210.0, 180.0, 400.0, 3.0, 399.0, 1_000.0, 120.0];
    for offset in offsets {
        c.on_scroll_offset_changed(offset);
        let head = c.window_range().start;
        assert_eq!(c.spacer(), expected_spacer(&heights, head, 2.0), "offset {offset}");
        for placed in c.window() {
            assert_eq!(placed.height, heights[placed.index]);
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn worker_load_feeds_controller() {
    let file = write_sheet(
        r#"[{"type": 0, "content": "one"}, {"type": 1}, {"type": "text", "content": "three"}]"#,
    );
    let source = JsonFileSource::new(file.path(), Order::AsStored);

    let mut loader: Loader<Vec<Entry>> = Loader::new();
    loader.spawn(move || source.provide());
    let entries = loader.wait().unwrap().unwrap();

    let mut c = controller(40.0, 1.0, 2);
    c.fetch_data(entries);
    assert_eq!(c.window_range(), 0..3);
    assert_eq!(c.entries()[1], Entry::image(""));
    assert_eq!(c.max_offset(), Some(0.0));
}

#[test]
fn malformed_sheet_reports_path() {
    let file = write_sheet(r#"[{"type": "Video", "content": "x"}]"#);
    let err = JsonFileSource::new(file.path(), Order::AsStored)
        .provide()
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("failed to parse"), "{msg}");
    assert!(msg.contains(&file.path().display().to_string()), "{msg}");
}

#[test]
fn missing_sheet_reports_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = JsonFileSource::new(&path, Order::AsStored)
        .provide()
        .unwrap_err();
    assert!(format!("{err:#}").contains("failed to read"));
}

#[test]
fn seeded_shuffle_is_reproducible_permutation() {
    let entries = mixed_entries(64);
    let json = serde_json::to_string(&entries).unwrap();
    let file = write_sheet(&json);

    let a = JsonFileSource::new(file.path(), Order::Shuffled(Some(42)))
        .provide()
        .unwrap();
    let b = JsonFileSource::new(file.path(), Order::Shuffled(Some(42)))
        .provide()
        .unwrap();
    assert_eq!(a, b);
    assert_ne!(a, entries);

    let mut sorted_a: Vec<String> = a.iter().map(|e| e.to_string()).collect();
    let mut sorted_orig: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    sorted_a.sort();
    sorted_orig.sort();
    assert_eq!(sorted_a, sorted_orig);
}

#[test]
fn template_arriving_after_data_fills_window() {
    let mut c = controller(6.0, 1.0, 3);
    let ticket = c.begin_template_load();
    c.fetch_data(StaticSource::new(mixed_entries(40)).provide().unwrap());
    assert_eq!(c.pool_status(), PoolStatus::Loading);
    assert_eq!(c.window_len(), 0);

    let mut art_loader: Loader<String> = Loader::new();
    art_loader.spawn(|| Ok("/\\\n\\/\n".to_string()));
    let art = art_loader.wait().unwrap().unwrap();

    assert!(c.install_templates(ticket, template(0).with_image_art(&art)));
    assert_eq!(c.window_range().start, 0);
    assert!(c.content_extent() >= 6.0);
}

#[test]
fn failed_template_load_falls_back_to_default_art() {
    let mut c = controller(4.0, 1.0, 3);
    c.begin_template_load();
    c.fetch_data(vec![Entry::text("a"), Entry::text("b"), Entry::image("")]);

    let mut art_loader: Loader<String> = Loader::new();
    art_loader.spawn(|| Err(anyhow::anyhow!("art missing")));
    assert!(art_loader.wait().unwrap().is_err());

    c.cancel_template_load();
    assert_eq!(c.pool_status(), PoolStatus::Ready);
    assert_eq!(c.window_range(), 0..2);

    c.on_scroll_offset_changed(1.5);
    c.on_scroll_offset_changed(0.0);
    assert_eq!(c.window_range().start, 0);
    assert_eq!(total_active(&c), c.window_len());
}

// ---------------------------------------------------------------------------
// Window invariants under arbitrary scrolling
// ---------------------------------------------------------------------------

fn entry_strategy() -> impl Strategy<Value = Entry> {
    prop_oneof![
        3 => "[a-z ]{0,60}".prop_map(Entry::text),
        1 => Just(Entry::image("")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn window_invariants_hold(
        entries in prop::collection::vec(entry_strategy(), 0..80),
        offsets in prop::collection::vec(0u32..400, 1..40),
        viewport in 1u8..20,
        spacing in 0u8..3,
        art_rows in 1usize..6,
    ) {
        let viewport = viewport as f64;
        let spacing = spacing as f64;
        let n = entries.len();
        let heights = measured_heights(&entries, &template(art_rows));

        let mut c = controller(viewport, spacing, art_rows);
        c.fetch_data(entries);

        for raw in offsets {
            let offset = raw as f64;
            c.on_scroll_offset_changed(offset);

            let placed = c.window();
            if n == 0 {
                prop_assert!(placed.is_empty());
                continue;
            }
            prop_assert!(!placed.is_empty());

            // Contiguous, in range, stacked without gaps.
            for pair in placed.windows(2) {
                prop_assert_eq!(pair[1].index, pair[0].index + 1);
                prop_assert_eq!(pair[1].top, pair[0].top + pair[0].height + spacing);
            }
            let range = c.window_range();
            prop_assert!(range.end <= n);

            // Spacer accounts exactly for the released prefix.
            prop_assert_eq!(placed[0].top, c.spacer());
            prop_assert_eq!(c.spacer(), expected_spacer(&heights, range.start, spacing));
            if range.start == 0 {
                prop_assert_eq!(c.spacer(), 0.0);
            }

            // The viewport is covered unless the sheet ran out.
            if range.end < n {
                prop_assert!(c.content_extent() - offset >= viewport);
            }

            // Every active instance is bound in the window.
            prop_assert_eq!(total_active(&c), placed.len());
        }
    }
}
