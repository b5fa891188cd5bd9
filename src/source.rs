//! Data sources: where the entry sequence comes from.
//!
//! A source is queried once per session. Shuffling is a one-time permutation
//! applied here, before the controller ever sees the entries.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::entry::{Entry, parse_entries};

pub trait DataSource {
    /// Produce the ordered entry sequence for a new session.
    fn provide(&self) -> Result<Vec<Entry>>;
}

/// Entries held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<Entry>,
}

impl StaticSource {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl DataSource for StaticSource {
    fn provide(&self) -> Result<Vec<Entry>> {
        Ok(self.entries.clone())
    }
}

/// How a source orders its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    AsStored,
    /// Random permutation. `None` seeds from the clock on every load.
    Shuffled(Option<u64>),
}

/// A JSON data sheet on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    order: Order,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, order: Order) -> Self {
        Self {
            path: path.into(),
            order,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for status display.
    pub fn display_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}

impl DataSource for JsonFileSource {
    fn provide(&self) -> Result<Vec<Entry>> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut entries = parse_entries(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        info!(
            "source: loaded {} entries from {}",
            entries.len(),
            self.path.display()
        );

        if let Order::Shuffled(seed) = self.order {
            let seed = seed.unwrap_or_else(clock_seed);
            debug!("source: shuffling with seed {seed}");
            shuffle(&mut entries, seed);
        }
        Ok(entries)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15)
}

/// Fisher–Yates shuffle driven by xorshift64. Deterministic for a given seed.
pub fn shuffle<T>(items: &mut [T], seed: u64) {
    // xorshift64 must never hold a zero state.
    let mut state = seed.wrapping_add(1).max(1);
    for i in (1..items.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_sheet(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn static_source_returns_entries() {
        let src = StaticSource::new(vec![Entry::text("a"), Entry::image("")]);
        assert_eq!(src.provide().unwrap().len(), 2);
    }

    #[test]
    fn json_source_reads_file() {
        let f = write_sheet(r#"[{"type":"Text","content":"A"},{"type":"Image","content":""}]"#);
        let src = JsonFileSource::new(f.path(), Order::AsStored);
        let entries = src.provide().unwrap();
        assert_eq!(entries, vec![Entry::text("A"), Entry::image("")]);
    }

    #[test]
    fn json_source_empty_array() {
        let f = write_sheet("[]");
        let src = JsonFileSource::new(f.path(), Order::AsStored);
        assert!(src.provide().unwrap().is_empty());
    }

    #[test]
    fn json_source_missing_file_is_error() {
        let src = JsonFileSource::new("/nonexistent/sheet.json", Order::AsStored);
        let err = src.provide().unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }

    #[test]
    fn json_source_malformed_is_error() {
        let f = write_sheet("{not json");
        let src = JsonFileSource::new(f.path(), Order::AsStored);
        let err = src.provide().unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, 1234);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_is_deterministic_per_seed() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&mut a, 99);
        shuffle(&mut b, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn shuffled_source_keeps_all_entries() {
        let f = write_sheet(
            r#"[{"type":"Text","content":"1"},{"type":"Text","content":"2"},
                {"type":"Text","content":"3"},{"type":"Image","content":""}]"#,
        );
        let src = JsonFileSource::new(f.path(), Order::Shuffled(Some(5)));
        let mut got: Vec<String> = src
            .provide()
            .unwrap()
            .into_iter()
            .map(|e| e.to_string())
            .collect();
        got.sort();
        assert_eq!(got, vec!["Image : ", "Text : 1", "Text : 2", "Text : 3"]);
    }
}
