//! Throughput benchmarks for the inbox fast paths.
//!
//! Single-threaded benches measure the per-operation cost of the slot
//! protocol without contention; the cross-thread benches drive a full
//! producer/consumer pair (and an MPMC fleet) and report messages per
//! second.

use std::hint::black_box;
use std::thread;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use courier::constants::DEFAULT_INBOX_CAPACITY;
use courier::TypedInbox;

const SPSC_MESSAGES: u64 = 1_000_000;

fn bench_uncontended_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontended");
    group.throughput(Throughput::Elements(1));

    let inbox = TypedInbox::<u64>::create(DEFAULT_INBOX_CAPACITY, "bench").unwrap();
    group.bench_function("try_write_try_read", |b| {
        b.iter(|| {
            assert!(inbox.try_write(black_box(&7)));
            // SAFETY: the bench thread is the only reader.
            black_box(unsafe { inbox.try_read() }).unwrap()
        })
    });

    let inbox = TypedInbox::<u64>::create(DEFAULT_INBOX_CAPACITY, "bench").unwrap();
    group.bench_function("spin_write_spin_read", |b| {
        b.iter(|| {
            inbox.spin_write(black_box(&7));
            // SAFETY: the bench thread is the only reader.
            black_box(unsafe { inbox.spin_read() })
        })
    });

    let inbox = TypedInbox::<u64>::create(DEFAULT_INBOX_CAPACITY, "bench").unwrap();
    group.bench_function("shared_read", |b| {
        b.iter(|| {
            inbox.spin_write(black_box(&7));
            black_box(inbox.spin_shared_read())
        })
    });

    group.finish();
}

fn bench_spsc_spin(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(SPSC_MESSAGES));
    group.sample_size(10);

    group.bench_function("spin_1m", |b| {
        b.iter_custom(|iters| {
            let mut total = std::time::Duration::ZERO;
            for _ in 0..iters {
                let inbox = TypedInbox::<u64>::create(DEFAULT_INBOX_CAPACITY, "bench").unwrap();
                let consumer = {
                    let inbox = inbox.clone();
                    thread::spawn(move || {
                        let mut acc = 0u64;
                        for _ in 0..SPSC_MESSAGES {
                            // SAFETY: the consumer thread is the only reader.
                            acc = acc.wrapping_add(unsafe { inbox.spin_read() });
                        }
                        black_box(acc)
                    })
                };

                let start = Instant::now();
                for k in 0..SPSC_MESSAGES {
                    inbox.spin_write(&k);
                }
                consumer.join().unwrap();
                total += start.elapsed();
            }
            total
        })
    });

    group.finish();
}

fn bench_mpmc_shared(c: &mut Criterion) {
    let producers = num_cpus::get().clamp(2, 4) as u64;
    let consumers = producers as usize;
    let per_producer = SPSC_MESSAGES / producers;

    let mut group = c.benchmark_group("mpmc");
    group.throughput(Throughput::Elements(per_producer * producers));
    group.sample_size(10);

    group.bench_function(format!("shared_spin_{producers}p{consumers}c"), |b| {
        b.iter_custom(|iters| {
            let mut total = std::time::Duration::ZERO;
            for _ in 0..iters {
                let inbox = TypedInbox::<u64>::create(DEFAULT_INBOX_CAPACITY, "bench").unwrap();
                let start = Instant::now();

                let mut handles = Vec::new();
                for _ in 0..producers {
                    let inbox = inbox.clone();
                    handles.push(thread::spawn(move || {
                        for k in 0..per_producer {
                            inbox.spin_write(&k);
                        }
                    }));
                }
                let expected = per_producer * producers;
                for _ in 0..consumers {
                    let inbox = inbox.clone();
                    let quota = expected / (consumers as u64);
                    handles.push(thread::spawn(move || {
                        let mut acc = 0u64;
                        for _ in 0..quota {
                            acc = acc.wrapping_add(inbox.spin_shared_read());
                        }
                        black_box(acc);
                    }));
                }
                for handle in handles {
                    handle.join().unwrap();
                }
                total += start.elapsed();
            }
            total
        })
    });

    group.finish();
}

criterion_group!(benches, bench_uncontended_ops, bench_spsc_spin, bench_mpmc_shared);
criterion_main!(benches);
