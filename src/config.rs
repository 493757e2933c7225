//! Configuration types for multi-lookup
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::dns::AddressFamily;
use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 10;

/// Largest accepted queue capacity
pub const MAX_QUEUE_SIZE: usize = 1_000_000;

/// Fewest resolver threads a run will use
pub const MIN_RESOLVERS: usize = 2;

/// Maximum reasonable resolver count
pub const MAX_RESOLVERS: usize = 1024;

/// Resolve hostnames from files in parallel
#[derive(Parser, Debug, Clone)]
#[command(
    name = "multi-lookup",
    version,
    about = "Resolve hostnames from files in parallel",
    long_about = "Reads whitespace-separated hostnames from each input file (one reader thread per file), \
                  resolves them with a pool of resolver threads and writes one `hostname,ip` line per \
                  hostname to the output file. Hostnames that fail to resolve get an empty address.",
    override_usage = "multi-lookup [OPTIONS] <INPUT>... <OUTPUT>",
    after_help = "EXAMPLES:\n    \
        multi-lookup names1.txt names2.txt results.txt\n    \
        multi-lookup -r 16 --queue-size 100 input/*.txt results.txt\n    \
        multi-lookup --family ipv6 hosts.txt results.txt"
)]
pub struct CliArgs {
    /// Input files followed by the output file
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Number of resolver threads [default: one per core, at least 2]
    #[arg(short = 'r', long, value_name = "NUM")]
    pub resolvers: Option<usize>,

    /// Hostname queue capacity
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE, value_name = "NUM")]
    pub queue_size: usize,

    /// Upper bound of a random delay before each queued hostname
    #[arg(long, default_value_t = 0, value_name = "MICROS")]
    pub max_jitter_us: u64,

    /// Address family to report
    #[arg(long, value_enum, default_value_t = AddressFamily::Any)]
    pub family: AddressFamily,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// One resolver per core, never fewer than `MIN_RESOLVERS`
pub fn default_resolvers() -> usize {
    pick_resolvers(None, num_cpus::get()).0
}

/// Resolver pool size for an optional `-r` value on a host with `cpus` cores
///
/// The second value is true when the core count was raised to the floor.
/// An explicit request is returned as is and validated by the caller.
fn pick_resolvers(requested: Option<usize>, cpus: usize) -> (usize, bool) {
    match requested {
        Some(count) => (count, false),
        None => (cpus.max(MIN_RESOLVERS), cpus < MIN_RESOLVERS),
    }
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Input files, one requester each
    pub inputs: Vec<PathBuf>,

    /// Output file
    pub output_path: PathBuf,

    /// Number of resolver threads
    pub resolver_count: usize,

    /// Queue capacity
    pub queue_size: usize,

    /// Maximum random delay before each push
    pub max_jitter: Duration,

    /// Address family preference
    pub family: AddressFamily,

    /// Show progress indicator
    pub show_progress: bool,
}

impl LookupConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut inputs = args.paths;
        if inputs.len() < 2 {
            return Err(ConfigError::MissingPaths { given: inputs.len() });
        }
        // Checked above, the last path is always present
        let output_path = inputs.pop().unwrap_or_default();

        let cpus = num_cpus::get();
        let (resolver_count, raised) = pick_resolvers(args.resolvers, cpus);
        if raised {
            warn!(cpus = cpus, min = MIN_RESOLVERS, "Fewer cores than the minimum resolver count");
        }

        if resolver_count < MIN_RESOLVERS || resolver_count > MAX_RESOLVERS {
            return Err(ConfigError::InvalidResolverCount {
                count: resolver_count,
                min: MIN_RESOLVERS,
                max: MAX_RESOLVERS,
            });
        }

        // Zero is left to queue initialization
        if args.queue_size > MAX_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                max: MAX_QUEUE_SIZE,
            });
        }

        if let Some(input) = inputs.iter().find(|input| same_file(input, &output_path)) {
            return Err(ConfigError::InvalidOutputPath {
                path: output_path.clone(),
                reason: format!("would overwrite input file '{}'", input.display()),
            });
        }

        Ok(Self {
            inputs,
            output_path,
            resolver_count,
            queue_size: args.queue_size,
            max_jitter: Duration::from_micros(args.max_jitter_us),
            family: args.family,
            show_progress: !args.quiet,
        })
    }

    /// Configuration with default settings for the given paths
    pub fn for_paths(inputs: Vec<PathBuf>, output_path: PathBuf) -> Self {
        Self {
            inputs,
            output_path,
            resolver_count: default_resolvers(),
            queue_size: DEFAULT_QUEUE_SIZE,
            max_jitter: Duration::ZERO,
            family: AddressFamily::Any,
            show_progress: false,
        }
    }
}

/// Whether two paths name the same file, following symlinks when both exist
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
