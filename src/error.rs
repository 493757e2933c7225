//! Error types for multi-lookup
//!
//! This module defines the error hierarchy for:
//! - Configuration and CLI errors
//! - Bounded queue errors
//! - Worker thread errors (spawn, panic)
//! - Per-requester input errors
//! - Name resolution errors
//!
//! Only configuration, initialization and spawn errors are fatal. Requester
//! and resolver errors are logged by the worker that hit them and never cross
//! a thread boundary.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes, one per fatal error class
pub mod exit_code {
    /// Invalid arguments or argument count
    pub const ARGS: u8 = 255;

    /// Output file could not be opened
    pub const OUTPUT_OPEN: u8 = 1;

    /// A worker thread could not be spawned
    pub const THREAD_SPAWN: u8 = 2;

    /// None of the input files could be opened
    pub const NO_READABLE_INPUT: u8 = 3;

    /// Queue or synchronization setup failed
    pub const INIT: u8 = 5;

    /// Anything else
    pub const OTHER: u8 = 70;
}

/// Top-level error type for the multi-lookup application
#[derive(Error, Debug)]
pub enum LookupError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Queue initialization errors
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Output file could not be created
    #[error("Failed to open output file '{path}': {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every input file failed to open
    #[error("None of the {attempted} input file(s) could be opened")]
    NoReadableInput { attempted: usize },

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

impl LookupError {
    /// Exit code the CLI reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            LookupError::Config(_) => exit_code::ARGS,
            LookupError::Queue(_) => exit_code::INIT,
            LookupError::Worker(WorkerError::SpawnFailed { .. }) => exit_code::THREAD_SPAWN,
            LookupError::Worker(_) => exit_code::OTHER,
            LookupError::OutputOpen { .. } => exit_code::OUTPUT_OPEN,
            LookupError::NoReadableInput { .. } => exit_code::NO_READABLE_INPUT,
            LookupError::Interrupted => exit_code::OTHER,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Fewer than one input plus one output path
    #[error("Not enough arguments: {given} path(s) given, need at least one input file and one output file")]
    MissingPaths { given: usize },

    /// Invalid resolver count
    #[error("Invalid resolver count {count}: must be between {min} and {max}")]
    InvalidResolverCount { count: usize, min: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at most {max}")]
    InvalidQueueSize { size: usize, max: usize },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },
}

/// Bounded queue errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// A queue must hold at least one item
    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,
}

/// Which pool a worker belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Requester,
    Resolver,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRole::Requester => f.write_str("requester"),
            WorkerRole::Resolver => f.write_str("resolver"),
        }
    }
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread could not be created
    #[error("Failed to spawn {role} {id}: {reason}")]
    SpawnFailed {
        role: WorkerRole,
        id: usize,
        reason: String,
    },

    /// Worker panicked
    #[error("{role} {id} panicked: {message}")]
    Panicked {
        role: WorkerRole,
        id: usize,
        message: String,
    },
}

/// Errors local to a single requester
#[derive(Error, Debug)]
pub enum RequesterError {
    /// Input file could not be opened
    #[error("Failed to open input file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file could not be read
    #[error("Failed to read input file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was aborted while this requester was queueing
    #[error("Interrupted while queueing hostnames")]
    Interrupted,
}

/// Name resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Lookup succeeded but produced no usable address
    #[error("No address found for '{hostname}'")]
    NoAddress { hostname: String },

    /// The system resolver failed
    #[error("Lookup of '{hostname}' failed: {source}")]
    Lookup {
        hostname: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for LookupError
pub type Result<T> = std::result::Result<T, LookupError>;

/// Outcome of a single requester's run
#[derive(Debug)]
pub enum RequesterOutcome {
    /// Reached end of file
    Completed { path: PathBuf, queued: u64 },

    /// Stopped by an input error; `queued` items were still delivered
    Failed {
        path: PathBuf,
        queued: u64,
        error: RequesterError,
    },

    /// Stopped by an abort
    Interrupted { path: PathBuf, queued: u64 },
}

impl RequesterOutcome {
    /// Returns true if the whole file was consumed
    pub fn is_success(&self) -> bool {
        matches!(self, RequesterOutcome::Completed { .. })
    }

    /// Returns the input path associated with this outcome
    pub fn path(&self) -> &PathBuf {
        match self {
            RequesterOutcome::Completed { path, .. } => path,
            RequesterOutcome::Failed { path, .. } => path,
            RequesterOutcome::Interrupted { path, .. } => path,
        }
    }

    /// Number of hostnames this requester pushed onto the queue
    pub fn queued(&self) -> u64 {
        match self {
            RequesterOutcome::Completed { queued, .. } => *queued,
            RequesterOutcome::Failed { queued, .. } => *queued,
            RequesterOutcome::Interrupted { queued, .. } => *queued,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            LookupError::Config(ConfigError::MissingPaths { given: 1 }),
            LookupError::OutputOpen {
                path: "/nope/out.txt".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
            LookupError::Worker(WorkerError::SpawnFailed {
                role: WorkerRole::Resolver,
                id: 0,
                reason: "out of threads".into(),
            }),
            LookupError::NoReadableInput { attempted: 2 },
            LookupError::Queue(QueueError::ZeroCapacity),
        ];

        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_interrupted_exit_code() {
        assert_eq!(LookupError::Interrupted.exit_code(), exit_code::OTHER);
        let panicked = LookupError::Worker(WorkerError::Panicked {
            role: WorkerRole::Requester,
            id: 3,
            message: "boom".into(),
        });
        assert_eq!(panicked.exit_code(), exit_code::OTHER);
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidQueueSize { size: 5, max: 1 };
        let err: LookupError = config_err.into();
        assert!(matches!(err, LookupError::Config(_)));
        assert_eq!(err.exit_code(), exit_code::ARGS);
    }

    #[test]
    fn test_requester_outcome_accessors() {
        let outcome = RequesterOutcome::Failed {
            path: "names.txt".into(),
            queued: 3,
            error: RequesterError::Interrupted,
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.queued(), 3);
        assert_eq!(outcome.path(), &PathBuf::from("names.txt"));
    }
}
