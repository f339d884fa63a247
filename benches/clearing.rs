//! Benchmarks for the order queue and the clearing engine.
//!
//! ## Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run specific benchmark
//! cargo bench -- queue_insert
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

use batch_auction::engine::{advance, ClearingScan, InterimState};
use batch_auction::types::{Order, QUEUE_START};
use batch_auction::{compute_clearing, OrderQueue};

// ============================================================================
// HELPER FUNCTIONS - Deterministic order generation
// ============================================================================

/// Random orders with distinct owners. Same seed = same orders.
fn generate_orders(count: usize, seed: u64) -> Vec<Order> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let sell = rng.gen_range(1_000..1_000_000u128);
            let buy = rng.gen_range(1_000..1_000_000u128);
            Order::new(2 + i as u64, buy, sell).unwrap()
        })
        .collect()
}

fn populate(orders: &[Order]) -> OrderQueue {
    let mut queue = OrderQueue::with_capacity(orders.len());
    for order in orders {
        queue.insert(*order, &QUEUE_START.encode()).unwrap();
    }
    queue
}

/// Auctioneer order selling `supply` with a negligible reserve.
fn initial(supply: u128) -> Order {
    Order::new(1, 1, supply).unwrap()
}

// ============================================================================
// BENCHMARK: Queue insertion
// ============================================================================

fn bench_queue_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_insert");
    group.measurement_time(Duration::from_secs(5));

    let book = generate_orders(1_000, 42);
    let mut sorted = book.clone();
    sorted.sort();

    // Exact hint: the predecessor of every order is already known.
    group.bench_function("exact_hint_1k", |b| {
        b.iter_batched(
            OrderQueue::new,
            |mut queue| {
                let mut hint = QUEUE_START.encode();
                for order in &sorted {
                    queue.insert(*order, &hint).unwrap();
                    hint = order.encode();
                }
                black_box(queue)
            },
            BatchSize::SmallInput,
        );
    });

    // Worst case: every order scans from the start of the queue.
    group.bench_function("start_hint_1k", |b| {
        b.iter_batched(
            OrderQueue::new,
            |mut queue| {
                for order in &book {
                    queue.insert(*order, &QUEUE_START.encode()).unwrap();
                }
                black_box(queue)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// BENCHMARK: Clearing
// ============================================================================

fn bench_clearing(c: &mut Criterion) {
    let mut group = c.benchmark_group("clearing");

    for size in [100usize, 1_000, 10_000] {
        let orders = generate_orders(size, 7);
        let queue = populate(&orders);
        let sorted: Vec<Order> = queue.iter().copied().collect();
        let total: u128 = sorted.iter().map(|o| o.sell_amount).sum();

        group.throughput(Throughput::Elements(size as u64));

        // Supply larger than any demand: the scan walks the whole book.
        group.bench_with_input(BenchmarkId::new("full_scan", size), &sorted, |b, sorted| {
            let initial = initial(total * 1_000_000);
            b.iter(|| black_box(compute_clearing(sorted, &initial).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("from_queue", size), &queue, |b, queue| {
            let initial = initial(total / 2);
            b.iter(|| black_box(ClearingScan::new(initial).run(queue.iter()).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// BENCHMARK: Incremental summing
// ============================================================================

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");

    let orders = generate_orders(10_000, 11);
    let queue = populate(&orders);
    let total: u128 = orders.iter().map(|o| o.sell_amount).sum();
    let initial = initial(total * 1_000_000);

    for steps in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &steps| {
            b.iter(|| {
                black_box(
                    advance(&queue, &initial, &InterimState::default(), steps, 100_000).unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_queue_insert, bench_clearing, bench_advance);
criterion_main!(benches);
