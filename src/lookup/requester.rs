//! Requester threads - one per input file
//!
//! Each requester:
//! - Opens its input file (a failure ends it early but still counts it out)
//! - Opens the startup gate on the first successful open
//! - Reads whitespace-separated hostnames, truncating overlong ones
//! - Pushes each hostname onto the shared queue, blocking while it is full
//!
//! Requesters never touch the output file.

use crate::error::{RequesterError, RequesterOutcome, WorkerError, WorkerRole};
use crate::lookup::context::{LookupContext, RequesterGuard};
use crate::lookup::queue::{Hostname, WorkItem, MAX_NAME_LENGTH};
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// A requester thread reading one input file
pub struct Requester {
    /// Requester ID
    id: usize,

    /// Input file
    path: PathBuf,

    /// Thread handle
    handle: Option<JoinHandle<RequesterOutcome>>,
}

impl Requester {
    /// Spawn a requester for `path`
    ///
    /// The guard travels into the thread. If spawning fails it is dropped
    /// here, so the requester is still counted out.
    pub fn spawn(
        id: usize,
        path: PathBuf,
        guard: RequesterGuard,
        max_jitter: Duration,
    ) -> Result<Self, WorkerError> {
        let thread_path = path.clone();

        let handle = thread::Builder::new()
            .name(format!("requester-{}", id))
            .spawn(move || requester_loop(id, thread_path, guard, max_jitter))
            .map_err(|e| WorkerError::SpawnFailed {
                role: WorkerRole::Requester,
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            path,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Wait for the requester to finish
    pub fn join(mut self) -> Result<RequesterOutcome, WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                role: WorkerRole::Requester,
                id: self.id,
                message: "Requester thread panicked".into(),
            }),
            None => Ok(RequesterOutcome::Interrupted {
                path: self.path.clone(),
                queued: 0,
            }),
        }
    }
}

/// Body of a requester thread
///
/// `guard` is dropped on every return path, marking this requester finished.
pub fn requester_loop(
    id: usize,
    path: PathBuf,
    guard: RequesterGuard,
    max_jitter: Duration,
) -> RequesterOutcome {
    let ctx = Arc::clone(guard.context());

    let file = match File::open(&path) {
        Ok(file) => file,
        Err(source) => {
            ctx.stats().record_input_failed();
            let error = RequesterError::Open { path: path.clone(), source };
            error!(requester = id, error = %error, "Input file unavailable");
            return RequesterOutcome::Failed {
                path,
                queued: 0,
                error,
            };
        }
    };

    ctx.stats().record_input_opened();
    ctx.open_gate();
    debug!(requester = id, path = %path.display(), "Input file opened");

    let source: Arc<str> = Arc::from(path.display().to_string());
    let outcome = feed_queue(id, &ctx, file, &source, max_jitter);

    match outcome {
        Ok(queued) => {
            info!(requester = id, path = %path.display(), queued = queued, "Requester finished");
            RequesterOutcome::Completed { path, queued }
        }
        Err((queued, RequesterError::Interrupted)) => {
            debug!(requester = id, queued = queued, "Requester interrupted");
            RequesterOutcome::Interrupted { path, queued }
        }
        Err((queued, error)) => {
            ctx.stats().record_input_failed();
            error!(requester = id, queued = queued, error = %error, "Requester stopped early");
            RequesterOutcome::Failed {
                path,
                queued,
                error,
            }
        }
    }
}

/// Read every hostname from `input` and queue it
///
/// Returns the number queued, or that number together with the error that
/// stopped the requester.
fn feed_queue<R: Read>(
    id: usize,
    ctx: &LookupContext,
    input: R,
    source: &Arc<str>,
    max_jitter: Duration,
) -> Result<u64, (u64, RequesterError)> {
    let mut reader = BufReader::new(input);
    let mut line = Vec::new();
    let mut queued = 0u64;
    let mut rng = rand::thread_rng();
    let jitter_us = max_jitter.as_micros() as u64;

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                let error = RequesterError::Read {
                    path: PathBuf::from(source.as_ref()),
                    source: e,
                };
                return Err((queued, error));
            }
        }

        let text = String::from_utf8_lossy(&line);
        for token in text.split_whitespace() {
            let (hostname, truncated) = Hostname::from_token(token);
            if truncated {
                ctx.stats().record_truncated();
                warn!(
                    requester = id,
                    hostname = %hostname,
                    max = MAX_NAME_LENGTH,
                    "Hostname truncated"
                );
            }

            if jitter_us > 0 {
                thread::sleep(Duration::from_micros(rng.gen_range(0..=jitter_us)));
            }

            let item = WorkItem::new(hostname, id, Arc::clone(source));
            if let Err(item) = ctx.push(item) {
                trace!(requester = id, hostname = %item.hostname, "Push refused");
                return Err((queued, RequesterError::Interrupted));
            }

            ctx.stats().record_read();
            queued += 1;
        }
    }

    Ok(queued)
}
