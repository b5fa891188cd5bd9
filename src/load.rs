//! Last-writer-wins bookkeeping for asynchronous loads.
//!
//! Every load is issued a [`LoadTicket`]. Only the most recently issued ticket
//! may deliver a result; completions carrying an older ticket are stale and
//! must be dropped by whoever receives them.
//!
//! [`Loader`] runs load closures on worker threads and hands results back over
//! an `mpsc` channel. The receiving thread drains with `try_recv()` at each
//! poll cycle, so the controller is only ever touched from one thread.

use std::sync::mpsc;
use std::thread;

use log::debug;

/// Generation number of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Issues tickets and decides which completion is allowed through.
#[derive(Debug, Default)]
pub struct LoadGate {
    latest: u64,
    pending: bool,
}

impl LoadGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load. Any load still in flight becomes stale.
    pub fn begin(&mut self) -> LoadTicket {
        self.latest += 1;
        self.pending = true;
        LoadTicket(self.latest)
    }

    /// Accept a completion. Returns `true` only for the latest, still pending
    /// ticket; the gate is then no longer pending.
    pub fn accept(&mut self, ticket: LoadTicket) -> bool {
        if self.pending && ticket.0 == self.latest {
            self.pending = false;
            true
        } else {
            debug!(
                "load: dropping stale completion #{} (latest #{}, pending={})",
                ticket.0, self.latest, self.pending
            );
            false
        }
    }

    /// Abandon the in-flight load. Its completion will be rejected.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Runs loads on worker threads and collects their ticketed results.
pub struct Loader<T> {
    gate: LoadGate,
    tx: mpsc::Sender<(LoadTicket, anyhow::Result<T>)>,
    rx: mpsc::Receiver<(LoadTicket, anyhow::Result<T>)>,
}

impl<T: Send + 'static> Default for Loader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Loader<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            gate: LoadGate::new(),
            tx,
            rx,
        }
    }

    /// Spawn `load` on a worker thread under a fresh ticket.
    pub fn spawn<F>(&mut self, load: F) -> LoadTicket
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let ticket = self.gate.begin();
        let tx = self.tx.clone();
        debug!("load: spawning #{}", ticket.0);
        thread::spawn(move || {
            let result = load();
            // Receiver gone means the host shut down; nothing to report to.
            let _ = tx.send((ticket, result));
        });
        ticket
    }

    /// Drain finished loads and return the latest accepted one, if any.
    /// Non-blocking.
    pub fn poll(&mut self) -> Option<anyhow::Result<T>> {
        let mut accepted = None;
        while let Ok((ticket, result)) = self.rx.try_recv() {
            if self.gate.accept(ticket) {
                accepted = Some(result);
            }
        }
        accepted
    }

    /// Block until the latest load completes. Stale completions that arrive
    /// first are skipped. Returns `None` when nothing is pending.
    pub fn wait(&mut self) -> Option<anyhow::Result<T>> {
        while self.gate.is_pending() {
            let (ticket, result) = self.rx.recv().ok()?;
            if self.gate.accept(ticket) {
                return Some(result);
            }
        }
        None
    }

    pub fn cancel(&mut self) {
        self.gate.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.gate.is_pending()
    }
}
