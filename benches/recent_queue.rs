use std::{sync::Arc, thread, time::Duration};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use recent::sync::RecentQueue;

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("recent_queue");
    group.throughput(Throughput::Elements(1));
    group.bench_function("insert into full queue", |b| {
        let queue = RecentQueue::new(1024);
        for i in 0..1024u64 {
            queue.insert(i);
        }
        b.iter(|| queue.insert(criterion::black_box(7u64)))
    });
    group.bench_function("insert/remove pair", |b| {
        let queue = RecentQueue::new(1024);
        b.iter(|| {
            queue.insert(10u64);
            criterion::black_box(queue.try_remove())
        })
    });
    group.finish();
}

fn bench_producers_consumer(c: &mut Criterion) {
    const PRODUCERS: u64 = 4;
    const REPETITIONS: u64 = 1_000_000;
    let mut group = c.benchmark_group("recent_queue");
    group.significance_level(0.1).sample_size(10);
    group.throughput(Throughput::Elements(PRODUCERS * REPETITIONS));
    group.bench_function("producers/consumer", |b| {
        b.iter(|| {
            let queue = Arc::new(RecentQueue::new(1024));
            let consumer = {
                let queue = queue.clone();
                thread::spawn(move || {
                    let mut received = 0u64;
                    while let Ok(Some(_)) = queue.remove_timeout(Duration::from_millis(10)) {
                        received += 1;
                    }
                    received
                })
            };
            let producers: Vec<_> = (0..PRODUCERS)
                .map(|_| {
                    let queue = queue.clone();
                    thread::spawn(move || {
                        for i in 0..REPETITIONS {
                            queue.insert(i);
                        }
                    })
                })
                .collect();
            for p in producers {
                p.join().unwrap();
            }
            criterion::black_box(consumer.join().unwrap());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_producers_consumer);
criterion_main!(benches);
