//! Lookup coordinator - orchestrates requesters and resolvers
//!
//! The coordinator is responsible for:
//! - Opening the output file and building the shared context
//! - Registering every requester before any thread starts
//! - Spawning the requester and resolver pools
//! - Releasing resolvers once the requester pool is joined
//! - Progress reporting and graceful shutdown
//! - Final statistics and cleanup

use crate::config::LookupConfig;
use crate::dns::{NameResolver, SystemResolver};
use crate::error::{LookupError, RequesterOutcome, Result, WorkerError};
use crate::lookup::context::{LookupContext, RequesterGuard};
use crate::lookup::requester::Requester;
use crate::lookup::resolver::Resolver;
use crate::output::OutputSink;
use crossbeam_channel::{select, tick};
use std::fs::File;
use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often `run_with_progress` reports
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a finished lookup run
#[derive(Debug)]
pub struct LookupResult {
    /// Hostnames read from all inputs
    pub hostnames_read: u64,

    /// Hostnames that had to be truncated
    pub truncated: u64,

    /// Lookups that produced an address
    pub resolved: u64,

    /// Lookups that failed
    pub failed: u64,

    /// Records written to the output
    pub written: u64,

    /// Records the output refused
    pub write_errors: u64,

    /// Input files opened
    pub inputs_opened: u64,

    /// Input files that could not be opened or read
    pub inputs_failed: u64,

    /// Per-input outcomes, in input order (panicked requesters are missing)
    pub outcomes: Vec<RequesterOutcome>,

    /// Worker threads that panicked
    pub panicked: u64,

    /// Number of requester threads
    pub requesters: usize,

    /// Number of resolver threads
    pub resolvers: usize,

    /// Queue capacity
    pub queue_capacity: usize,

    /// Largest queue length observed
    pub high_water: usize,

    /// Items dropped from the queue after an abort
    pub abandoned: usize,

    /// Time taken for the run
    pub duration: Duration,

    /// Whether the run completed (vs was interrupted)
    pub completed: bool,
}

impl LookupResult {
    /// Inputs that were opened and read without an error
    ///
    /// An input that opens but fails mid-read (a directory, say) is not
    /// counted, even though it shows up in `inputs_opened`.
    pub fn inputs_read(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o, RequesterOutcome::Failed { .. }))
            .count()
    }

    /// True when inputs were given but none of them could be read
    pub fn no_readable_input(&self) -> bool {
        self.requesters > 0 && self.inputs_read() == 0
    }

    /// Lookups per second over the whole run
    pub fn lookups_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            (self.resolved + self.failed) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct LookupProgress {
    /// Hostnames queued so far
    pub hostnames_read: u64,

    /// Successful lookups so far
    pub resolved: u64,

    /// Failed lookups so far
    pub failed: u64,

    /// Current queue length
    pub queue_len: usize,

    /// Queue capacity
    pub queue_capacity: usize,

    /// Requesters still running
    pub active_requesters: usize,

    /// Total resolvers
    pub total_resolvers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl LookupProgress {
    fn capture(ctx: &LookupContext, total_resolvers: usize, elapsed: Duration) -> Self {
        let snap = ctx.snapshot();
        let stats = ctx.stats();
        Self {
            hostnames_read: stats.hostnames_read.load(Ordering::Relaxed),
            resolved: stats.resolved.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            queue_len: snap.len,
            queue_capacity: snap.capacity,
            active_requesters: snap.active_requesters,
            total_resolvers,
            elapsed,
        }
    }

    /// Lookups finished so far
    pub fn processed(&self) -> u64 {
        self.resolved + self.failed
    }

    /// Calculate lookups per second rate
    pub fn lookups_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Cloneable handle that aborts a running lookup (for signal handlers)
#[derive(Clone)]
pub struct ShutdownHandle {
    ctx: Arc<LookupContext>,
}

impl ShutdownHandle {
    /// Stop the run: blocked requesters give up and resolvers stop early
    pub fn trigger(&self) {
        self.ctx.abort();
    }

    pub fn is_triggered(&self) -> bool {
        self.ctx.is_aborted()
    }
}

/// Coordinates the requester and resolver pools
pub struct Coordinator {
    /// Configuration
    config: Arc<LookupConfig>,

    /// Queue monitor, output sink and counters
    ctx: Arc<LookupContext>,

    /// Name resolution backend
    resolver: Arc<dyn NameResolver>,
}

impl Coordinator {
    /// Create a coordinator writing to the configured output file
    pub fn new(config: LookupConfig) -> Result<Self> {
        let file = File::create(&config.output_path).map_err(|source| LookupError::OutputOpen {
            path: config.output_path.clone(),
            source,
        })?;

        let resolver = Arc::new(SystemResolver::new(config.family));
        Self::with_parts(config, Box::new(file), resolver)
    }

    /// Create a coordinator with an explicit output writer and resolver
    pub fn with_parts(
        config: LookupConfig,
        writer: Box<dyn Write + Send>,
        resolver: Arc<dyn NameResolver>,
    ) -> Result<Self> {
        let ctx = LookupContext::new(config.queue_size, OutputSink::new(writer))?;

        Ok(Self {
            config: Arc::new(config),
            ctx: Arc::new(ctx),
            resolver,
        })
    }

    /// Get a handle that aborts this run
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            ctx: Arc::clone(&self.ctx),
        }
    }

    pub fn context(&self) -> &Arc<LookupContext> {
        &self.ctx
    }

    /// Run the lookup to completion
    pub fn run(&self) -> Result<LookupResult> {
        let start = Instant::now();

        info!(
            inputs = self.config.inputs.len(),
            resolvers = self.config.resolver_count,
            queue_size = self.config.queue_size,
            "Starting lookup"
        );

        let guards = self.ctx.register_requesters(self.config.inputs.len());
        let (requesters, mut spawn_error) = self.spawn_requesters(guards);

        let mut resolvers = Vec::new();
        if spawn_error.is_none() {
            let (spawned, err) = self.spawn_resolvers();
            resolvers = spawned;
            spawn_error = err;
        }

        if let Some(e) = &spawn_error {
            error!(error = %e, "Thread creation failed, aborting");
            self.ctx.abort();
        } else {
            info!(
                requesters = requesters.len(),
                resolvers = resolvers.len(),
                "Workers spawned"
            );
        }

        let requester_count = requesters.len();
        let resolver_count = resolvers.len();
        let (outcomes, requester_panics) = join_requesters(requesters);

        // Covers the case where no requester ever opened the gate
        self.ctx.release_resolvers();
        debug!("Requesters joined, resolvers released");

        let resolver_panics = join_resolvers(resolvers);

        if let Err(e) = self.ctx.output().flush() {
            error!(error = %e, "Failed to flush output");
        }

        let abandoned = self.ctx.drain_leftovers();
        if abandoned > 0 {
            warn!(abandoned = abandoned, "Hostnames left unresolved in the queue");
        }

        if let Some(e) = spawn_error {
            return Err(e.into());
        }

        let snap = self.ctx.snapshot();
        let stats = self.ctx.stats();
        let duration = start.elapsed();

        let result = LookupResult {
            hostnames_read: stats.hostnames_read.load(Ordering::Relaxed),
            truncated: stats.truncated.load(Ordering::Relaxed),
            resolved: stats.resolved.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            written: stats.written.load(Ordering::Relaxed),
            write_errors: stats.write_errors.load(Ordering::Relaxed),
            inputs_opened: stats.inputs_opened.load(Ordering::Relaxed),
            inputs_failed: stats.inputs_failed.load(Ordering::Relaxed),
            outcomes,
            panicked: requester_panics + resolver_panics,
            requesters: requester_count,
            resolvers: resolver_count,
            queue_capacity: snap.capacity,
            high_water: snap.high_water,
            abandoned,
            duration,
            completed: !snap.aborted,
        };

        info!(
            read = result.hostnames_read,
            resolved = result.resolved,
            failed = result.failed,
            written = result.written,
            duration_ms = duration.as_millis() as u64,
            "Lookup completed"
        );

        Ok(result)
    }

    /// Run with a callback receiving progress snapshots
    pub fn run_with_progress<F>(&self, progress_callback: F) -> Result<LookupResult>
    where
        F: Fn(LookupProgress) + Send + 'static,
    {
        let start = Instant::now();
        let ctx = Arc::clone(&self.ctx);
        let total_resolvers = self.config.resolver_count;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let ticker = thread::Builder::new()
            .name("progress".into())
            .spawn(move || {
                let ticks = tick(PROGRESS_INTERVAL);
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            progress_callback(LookupProgress::capture(&ctx, total_resolvers, start.elapsed()));
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
            });

        let ticker = match ticker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Progress thread unavailable, continuing without it");
                None
            }
        };

        let result = self.run();

        drop(stop_tx);
        if let Some(handle) = ticker {
            let _ = handle.join();
        }

        result
    }

    /// Spawn one requester per input, stopping at the first failure
    ///
    /// Guards for requesters that were never spawned are dropped here, so
    /// the active count still reaches zero.
    fn spawn_requesters(
        &self,
        guards: Vec<RequesterGuard>,
    ) -> (Vec<Requester>, Option<WorkerError>) {
        let mut requesters = Vec::with_capacity(guards.len());

        for (id, (path, guard)) in self.config.inputs.iter().zip(guards).enumerate() {
            match Requester::spawn(id, path.clone(), guard, self.config.max_jitter) {
                Ok(requester) => requesters.push(requester),
                Err(e) => return (requesters, Some(e)),
            }
        }

        (requesters, None)
    }

    /// Spawn the resolver pool, stopping at the first failure
    fn spawn_resolvers(&self) -> (Vec<Resolver>, Option<WorkerError>) {
        let mut resolvers = Vec::with_capacity(self.config.resolver_count);

        for id in 0..self.config.resolver_count {
            match Resolver::spawn(id, Arc::clone(&self.ctx), Arc::clone(&self.resolver)) {
                Ok(resolver) => resolvers.push(resolver),
                Err(e) => return (resolvers, Some(e)),
            }
        }

        (resolvers, None)
    }
}

/// Join requester threads, returning their outcomes and the panic count
fn join_requesters(requesters: Vec<Requester>) -> (Vec<RequesterOutcome>, u64) {
    let mut outcomes = Vec::with_capacity(requesters.len());
    let mut panicked = 0;

    for requester in requesters {
        match requester.join() {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                panicked += 1;
                warn!(error = %e, "Requester failed to join cleanly");
            }
        }
    }

    (outcomes, panicked)
}

/// Join resolver threads, returning the panic count
fn join_resolvers(resolvers: Vec<Resolver>) -> u64 {
    let mut panicked = 0;

    for resolver in resolvers {
        let id = resolver.id();
        match resolver.join() {
            Ok(report) => debug!(
                resolver = id,
                processed = report.processed,
                resolved = report.resolved,
                "Resolver joined"
            ),
            Err(e) => {
                panicked += 1;
                warn!(error = %e, "Resolver failed to join cleanly");
            }
        }
    }

    panicked
}
