//! Concurrent lookup engine
//!
//! Architecture:
//! ```text
//!   input files                                               output file
//!  ┌───────────┐                                             ┌───────────┐
//!  │ names1.txt│──▶ requester-0 ─┐                ┌─ resolver-0 ─▶│           │
//!  │ names2.txt│──▶ requester-1 ─┼─▶ LookupContext ┼─ resolver-1 ─▶│ host,ip   │
//!  │    ...    │──▶ requester-N ─┘   (bounded     └─ resolver-M ─▶│           │
//!  └───────────┘                      queue)                     └───────────┘
//! ```
//!
//! Requesters block when the queue is full; resolvers block when it is
//! empty. Resolvers exit once every requester has finished and the queue is
//! drained.

pub mod context;
pub mod coordinator;
pub mod queue;
pub mod requester;
pub mod resolver;

pub use context::{LookupContext, LookupStats, QueueSnapshot, RequesterGuard};
pub use coordinator::{Coordinator, LookupProgress, LookupResult, ShutdownHandle};
pub use queue::{BoundedQueue, Hostname, WorkItem, MAX_NAME_LENGTH};
pub use requester::Requester;
pub use resolver::{Resolver, ResolverReport};
