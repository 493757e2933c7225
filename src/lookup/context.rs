//! Shared lookup context - the monitor connecting requesters and resolvers
//!
//! All coordination state lives behind a single mutex:
//! - the bounded queue
//! - the number of requesters still running
//! - the startup gate
//! - the abort flag
//!
//! Three condition variables hang off that mutex:
//!
//! ```text
//!   requesters ──push──▶ [ BoundedQueue ] ──pop──▶ resolvers
//!        ▲  wait not_full        │         wait not_empty │
//!        └──── notify_one ◀──────┴──────▶ notify_one ─────┘
//!
//!   gate: resolvers wait once at startup; opened by the first requester
//!         that opens its input, by the last requester to finish, or by
//!         the coordinator after joining the requester pool
//! ```
//!
//! A resolver decides whether to exit while holding the same lock that
//! guards the requester count and the queue, and only releases it inside
//! `Condvar::wait`. A requester finishing after that check cannot slip its
//! broadcast in between, so no wakeup is lost.

use crate::error::QueueError;
use crate::lookup::queue::{BoundedQueue, WorkItem};
use crate::output::OutputSink;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Run-wide counters, updated lock-free by workers
#[derive(Debug, Default)]
pub struct LookupStats {
    /// Hostnames read and queued by requesters
    pub hostnames_read: AtomicU64,

    /// Hostnames longer than the limit that were cut short
    pub truncated: AtomicU64,

    /// Lookups that produced an address
    pub resolved: AtomicU64,

    /// Lookups that failed
    pub failed: AtomicU64,

    /// Records written to the output
    pub written: AtomicU64,

    /// Records the output refused
    pub write_errors: AtomicU64,

    /// Input files opened successfully
    pub inputs_opened: AtomicU64,

    /// Input files that could not be opened or read
    pub inputs_failed: AtomicU64,
}

impl LookupStats {
    pub(crate) fn record_read(&self) {
        self.hostnames_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_truncated(&self) {
        self.truncated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_input_opened(&self) {
        self.inputs_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_input_failed(&self) {
        self.inputs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Lookups finished so far, successful or not
    pub fn processed(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }
}

/// State guarded by the monitor lock
struct MonitorState {
    queue: BoundedQueue<WorkItem>,
    active_requesters: usize,
    gate_open: bool,
    aborted: bool,
}

/// Point-in-time view of the monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Items currently queued
    pub len: usize,

    /// Queue capacity
    pub capacity: usize,

    /// Free slots
    pub space: usize,

    /// Largest queue length so far
    pub high_water: usize,

    /// Items pushed so far
    pub pushed: u64,

    /// Items popped so far
    pub popped: u64,

    /// Requesters still running
    pub active_requesters: usize,

    /// Whether resolvers have been released
    pub gate_open: bool,

    /// Whether the run was aborted
    pub aborted: bool,
}

/// Everything requesters and resolvers share, handed to each at spawn time
pub struct LookupContext {
    state: Mutex<MonitorState>,
    not_full: Condvar,
    not_empty: Condvar,
    gate: Condvar,
    output: OutputSink,
    stats: LookupStats,
}

impl LookupContext {
    /// Create a context with a queue of `capacity` items
    pub fn new(capacity: usize, output: OutputSink) -> Result<Self, QueueError> {
        let queue = BoundedQueue::with_capacity(capacity)?;

        Ok(Self {
            state: Mutex::new(MonitorState {
                queue,
                active_requesters: 0,
                gate_open: false,
                aborted: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            gate: Condvar::new(),
            output,
            stats: LookupStats::default(),
        })
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    pub fn stats(&self) -> &LookupStats {
        &self.stats
    }

    /// Register `count` requesters before any of them start
    ///
    /// Each guard decrements the active count exactly once when dropped,
    /// whether its requester finished, failed, panicked or never ran.
    pub fn register_requesters(self: &Arc<Self>, count: usize) -> Vec<RequesterGuard> {
        self.state.lock().active_requesters += count;

        (0..count)
            .map(|_| RequesterGuard {
                ctx: Arc::clone(self),
            })
            .collect()
    }

    /// Open the startup gate; repeated calls are no-ops
    pub fn open_gate(&self) {
        let mut state = self.state.lock();
        Self::open_gate_locked(&mut state, &self.gate);
    }

    fn open_gate_locked(state: &mut MonitorState, gate: &Condvar) {
        if !state.gate_open {
            state.gate_open = true;
            gate.notify_all();
            debug!("Startup gate opened");
        }
    }

    /// Block until the startup gate is open (or the run is aborted)
    pub fn wait_for_gate(&self) {
        let mut state = self.state.lock();
        while !state.gate_open && !state.aborted {
            self.gate.wait(&mut state);
        }
    }

    /// Queue an item, blocking while the queue is full
    ///
    /// Fails only if the run was aborted; the item is handed back.
    pub fn push(&self, item: WorkItem) -> Result<(), WorkItem> {
        let mut state = self.state.lock();
        while state.queue.is_full() && !state.aborted {
            trace!(requester = item.requester, "Queue full, waiting for space");
            self.not_full.wait(&mut state);
        }

        if state.aborted {
            return Err(item);
        }

        if let Err(item) = state.queue.push(item) {
            // The wait loop above guarantees space
            error!(hostname = %item.hostname, "Push onto a full queue after waiting for space");
            return Err(item);
        }

        self.not_empty.notify_one();
        Ok(())
    }

    /// Take the next item, or `None` once all work is done
    ///
    /// Returns `None` when no requester is active and the queue is empty, or
    /// when the run was aborted. Otherwise blocks until an item arrives.
    pub fn next_item(&self) -> Option<WorkItem> {
        let mut state = self.state.lock();
        loop {
            if state.aborted {
                return None;
            }

            if let Some(item) = state.queue.pop() {
                self.not_full.notify_one();
                return Some(item);
            }

            if state.active_requesters == 0 {
                return None;
            }

            self.not_empty.wait(&mut state);
        }
    }

    /// Open the gate and wake every resolver so it re-checks for exit
    ///
    /// Called by the coordinator once the requester pool has been joined.
    pub fn release_resolvers(&self) {
        let mut state = self.state.lock();
        Self::open_gate_locked(&mut state, &self.gate);
        self.not_empty.notify_all();
    }

    /// Abort the run: blocked requesters give up, resolvers stop draining
    pub fn abort(&self) {
        let mut state = self.state.lock();
        if state.aborted {
            return;
        }
        state.aborted = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.gate.notify_all();
        debug!("Lookup aborted");
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// Drop any items left in the queue, returning how many there were
    pub fn drain_leftovers(&self) -> usize {
        self.state.lock().queue.clear()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        let stats = state.queue.stats();
        QueueSnapshot {
            len: state.queue.len(),
            capacity: state.queue.capacity(),
            space: state.queue.remaining(),
            high_water: stats.high_water,
            pushed: stats.pushed,
            popped: stats.popped,
            active_requesters: state.active_requesters,
            gate_open: state.gate_open,
            aborted: state.aborted,
        }
    }

    fn requester_finished(&self) {
        let mut state = self.state.lock();
        state.active_requesters = state.active_requesters.saturating_sub(1);

        if state.active_requesters == 0 {
            // Nobody is left to open the gate or to push; release resolvers
            Self::open_gate_locked(&mut state, &self.gate);
            self.not_empty.notify_all();
            debug!("All requesters finished");
        }
    }
}

/// Registration of one running requester
///
/// Dropping it marks the requester finished.
pub struct RequesterGuard {
    ctx: Arc<LookupContext>,
}

impl RequesterGuard {
    pub fn context(&self) -> &Arc<LookupContext> {
        &self.ctx
    }
}

impl Drop for RequesterGuard {
    fn drop(&mut self) {
        self.ctx.requester_finished();
    }
}
