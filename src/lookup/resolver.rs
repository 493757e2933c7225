//! Resolver threads - the consumer pool
//!
//! Each resolver waits on the startup gate, then takes hostnames off the
//! queue until the context reports that every requester is done and the
//! queue is drained. Lookups and output writes happen outside the queue
//! lock.

use crate::dns::NameResolver;
use crate::error::{WorkerError, WorkerRole};
use crate::lookup::context::LookupContext;
use crate::lookup::queue::WorkItem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Per-resolver counters, returned when the thread exits
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolverReport {
    /// Items taken off the queue
    pub processed: u64,

    /// Lookups that produced an address
    pub resolved: u64,

    /// Lookups that failed
    pub failed: u64,
}

/// A resolver thread
pub struct Resolver {
    /// Resolver ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<ResolverReport>>,
}

impl Resolver {
    /// Spawn a resolver thread
    pub fn spawn(
        id: usize,
        ctx: Arc<LookupContext>,
        resolver: Arc<dyn NameResolver>,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name(format!("resolver-{}", id))
            .spawn(move || resolver_loop(id, &ctx, resolver.as_ref()))
            .map_err(|e| WorkerError::SpawnFailed {
                role: WorkerRole::Resolver,
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the resolver to finish
    pub fn join(mut self) -> Result<ResolverReport, WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                role: WorkerRole::Resolver,
                id: self.id,
                message: "Resolver thread panicked".into(),
            }),
            None => Ok(ResolverReport::default()),
        }
    }
}

/// Main resolver loop
pub fn resolver_loop(
    id: usize,
    ctx: &LookupContext,
    resolver: &dyn NameResolver,
) -> ResolverReport {
    ctx.wait_for_gate();
    debug!(resolver = id, "Resolver starting");

    let mut report = ResolverReport::default();

    while let Some(item) = ctx.next_item() {
        trace!(resolver = id, hostname = %item.hostname, "Popped");
        report.processed += 1;

        if process_item(id, ctx, resolver, &item) {
            report.resolved += 1;
        } else {
            report.failed += 1;
        }
    }

    debug!(
        resolver = id,
        processed = report.processed,
        failed = report.failed,
        "Resolver shutting down"
    );

    report
}

/// Resolve one hostname and write its record; returns whether it resolved
fn process_item(
    id: usize,
    ctx: &LookupContext,
    resolver: &dyn NameResolver,
    item: &WorkItem,
) -> bool {
    let hostname = item.hostname.as_str();

    let ip = match resolver.resolve(hostname) {
        Ok(ip) => {
            ctx.stats().record_resolved();
            Some(ip.to_string())
        }
        Err(e) => {
            ctx.stats().record_failed();
            warn!(resolver = id, source = %item.source, error = %e, "Lookup failed");
            None
        }
    };

    match ctx.output().write_record(hostname, ip.as_deref()) {
        Ok(()) => ctx.stats().record_written(),
        Err(e) => {
            ctx.stats().record_write_error();
            error!(resolver = id, hostname = %hostname, error = %e, "Failed to write record");
        }
    }

    ip.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::StaticResolver;
    use crate::lookup::queue::Hostname;
    use crate::output::OutputSink;
    use parking_lot::Mutex;
    use std::io::{self, Write};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::atomic::Ordering;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Writer that refuses everything
    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    fn item(name: &str) -> WorkItem {
        WorkItem::new(Hostname::from_token(name).0, 0, Arc::from("test"))
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new().with_entry("example.com", IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)))
    }

    #[test]
    fn test_failed_lookup_writes_empty_field() {
        let buf = SharedBuf::default();
        let ctx = LookupContext::new(4, OutputSink::new(Box::new(buf.clone()))).unwrap();
        let ctx = Arc::new(ctx);
        let guards = ctx.register_requesters(1);
        ctx.push(item("example.com")).unwrap();
        ctx.push(item("bogus.invalid")).unwrap();
        drop(guards);

        let report = resolver_loop(0, &ctx, &resolver());
        ctx.output().flush().unwrap();

        assert_eq!(
            report,
            ResolverReport {
                processed: 2,
                resolved: 1,
                failed: 1
            }
        );
        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(text, "example.com,93.184.216.34\nbogus.invalid,\n");
        assert_eq!(ctx.stats().written.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_write_error_does_not_stop_resolver() {
        // No buffering, so every record reaches the broken writer
        let sink = OutputSink::with_buffer_capacity(0, Box::new(BrokenWriter));
        let ctx = Arc::new(LookupContext::new(4, sink).unwrap());
        let guards = ctx.register_requesters(1);
        for i in 0..3 {
            ctx.push(item(&format!("h{}.test", i))).unwrap();
        }
        drop(guards);

        let report = resolver_loop(0, &ctx, &resolver());
        assert_eq!(report.processed, 3);
        assert_eq!(ctx.stats().write_errors.load(Ordering::Relaxed), 3);
        assert_eq!(ctx.stats().written.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_pool_drains_queue() {
        let buf = SharedBuf::default();
        let ctx = Arc::new(LookupContext::new(3, OutputSink::new(Box::new(buf.clone()))).unwrap());
        let mut guards = ctx.register_requesters(1);
        let dns: Arc<dyn NameResolver> = Arc::new(resolver());

        let resolvers: Vec<Resolver> = (0..3)
            .map(|id| Resolver::spawn(id, Arc::clone(&ctx), Arc::clone(&dns)).unwrap())
            .collect();

        ctx.open_gate();
        for i in 0..30 {
            ctx.push(item(&format!("h{}.test", i))).unwrap();
        }
        drop(guards.pop());

        let total: u64 = resolvers
            .into_iter()
            .map(|r| r.join().unwrap().processed)
            .sum();
        ctx.output().flush().unwrap();

        assert_eq!(total, 30);
        let text = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(text.lines().count(), 30);
        assert!(text.lines().all(|l| l.ends_with(',')));
    }
}
