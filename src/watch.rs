//! Data file watcher: monitors the entry sheet for changes via notify.
//!
//! notify::RecommendedWatcher runs callbacks on an internal thread.
//! SheetWatcher bridges change notifications to the viewer thread via
//! mpsc::channel; each change starts a new session load.

use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

pub struct SheetWatcher {
    rx: mpsc::Receiver<()>,
    interval: Duration,
    last_fired: Option<Instant>,
    _watcher: RecommendedWatcher, // Drop stops watching
}

impl SheetWatcher {
    /// Watch `path`, reporting at most one change per `interval`.
    ///
    /// Editors save by rename, which drops an inotify watch on the file
    /// itself, so the parent directory is watched and events are filtered by
    /// path.
    pub fn new(path: &Path, interval: Duration) -> Result<Self> {
        let canonical = path.canonicalize()?;
        let target = canonical.clone();
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let ours = event.paths.iter().any(|p| p == &target);
                    if ours && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
            },
            notify::Config::default(),
        )?;
        let parent = canonical
            .parent()
            .ok_or_else(|| anyhow::anyhow!("cannot watch root path"))?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
        debug!("watch: watching {}", canonical.display());

        Ok(Self {
            rx,
            interval,
            last_fired: None,
            _watcher: watcher,
        })
    }

    /// Return true if the sheet has changed since the last report
    /// (non-blocking). Queued notifications are collapsed; a change arriving
    /// within `interval` of the previous report stays queued for the next
    /// call.
    pub fn has_changed(&mut self) -> bool {
        if self
            .last_fired
            .is_some_and(|t| t.elapsed() < self.interval)
        {
            return false;
        }
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            self.last_fired = Some(Instant::now());
        }
        changed
    }
}
