//! multi-lookup - Parallel batch hostname resolver
//!
//! Reads hostnames from any number of input files and resolves them with a
//! pool of threads, writing one `hostname,ip` line per hostname.
//!
//! # Features
//!
//! - **One reader per file**: each input file gets its own requester thread.
//!
//! - **Parallel resolution**: a resolver pool sized to the machine (at least
//!   two threads) performs the lookups.
//!
//! - **Bounded memory**: a fixed-size queue with backpressure sits between
//!   the two pools, so huge inputs never pile up in memory.
//!
//! - **Failure isolation**: unreadable inputs and unresolvable names are
//!   logged and skipped (an unresolved name gets an empty address) without
//!   stopping the run.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Input Files                             │
//! └──────────────┬──────────────┬──────────────┬─────────────────┘
//!                │              │              │
//!                ▼              ▼              ▼
//!         ┌────────────┐ ┌────────────┐ ┌────────────┐
//!         │requester-0 │ │requester-1 │ │requester-N │
//!         └─────┬──────┘ └─────┬──────┘ └─────┬──────┘
//!               └──────────────┼──────────────┘
//!                              ▼
//!              ┌───────────────────────────────┐
//!              │        LookupContext          │
//!              │  bounded queue + monitor lock │
//!              │  not_full / not_empty / gate  │
//!              └───────────────┬───────────────┘
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!         ┌────────────┐ ┌────────────┐ ┌────────────┐
//!         │ resolver-0 │ │ resolver-1 │ │ resolver-M │
//!         └─────┬──────┘ └─────┬──────┘ └─────┬──────┘
//!               └──────────────┼──────────────┘
//!                              ▼
//!                    ┌──────────────────┐
//!                    │   Output File    │
//!                    │  hostname,ip\n   │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Resolve two lists into results.txt
//! multi-lookup names1.txt names2.txt results.txt
//!
//! # Larger queue, fixed pool size
//! multi-lookup -r 16 --queue-size 100 input/*.txt results.txt
//! ```

pub mod config;
pub mod dns;
pub mod error;
pub mod lookup;
pub mod output;
pub mod progress;

pub use config::{CliArgs, LookupConfig};
pub use dns::{AddressFamily, NameResolver, StaticResolver, SystemResolver};
pub use error::{LookupError, Result};
pub use lookup::{Coordinator, LookupProgress, LookupResult, ShutdownHandle};
