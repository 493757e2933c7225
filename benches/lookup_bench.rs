//! Benchmarks for multi-lookup
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_queue_operations(c: &mut Criterion) {
    use multi_lookup::lookup::queue::{BoundedQueue, Hostname, WorkItem};
    use std::sync::Arc;

    c.bench_function("queue_push_pop", |b| {
        let mut queue = BoundedQueue::with_capacity(10).unwrap();
        let source: Arc<str> = Arc::from("bench");

        b.iter(|| {
            let (hostname, _) = Hostname::from_token("www.example.com");
            queue
                .push(WorkItem::new(hostname, 0, Arc::clone(&source)))
                .unwrap();
            black_box(queue.pop());
        })
    });
}

fn benchmark_hostname_truncation(c: &mut Criterion) {
    use multi_lookup::lookup::queue::Hostname;

    let long = "x".repeat(400);
    c.bench_function("hostname_from_long_token", |b| {
        b.iter(|| black_box(Hostname::from_token(black_box(&long))))
    });
}

fn benchmark_pipeline(c: &mut Criterion) {
    use multi_lookup::config::LookupConfig;
    use multi_lookup::dns::{NameResolver, StaticResolver};
    use multi_lookup::lookup::Coordinator;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let mut inputs = Vec::new();
    let mut table = StaticResolver::new();
    for f in 0..4 {
        let names: Vec<String> = (0..2_500).map(|i| format!("host{}-{}.test", f, i)).collect();
        for (i, name) in names.iter().enumerate() {
            table = table.with_entry(name.clone(), IpAddr::V4(Ipv4Addr::new(10, f, (i / 256) as u8, (i % 256) as u8)));
        }
        let path = dir.path().join(format!("in{}.txt", f));
        std::fs::write(&path, names.join("\n")).unwrap();
        inputs.push(path);
    }
    let resolver: Arc<dyn NameResolver> = Arc::new(table);

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    group.bench_function("10k_hostnames_4_files", |b| {
        b.iter(|| {
            let config = LookupConfig::for_paths(inputs.clone(), dir.path().join("out.txt"));
            let coordinator =
                Coordinator::with_parts(config, Box::new(std::io::sink()), Arc::clone(&resolver))
                    .unwrap();
            black_box(coordinator.run().unwrap().written)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_queue_operations,
    benchmark_hostname_truncation,
    benchmark_pipeline
);
criterion_main!(benches);
