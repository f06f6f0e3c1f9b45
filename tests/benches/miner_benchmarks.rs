//! # Block Miner Benchmarks
//!
//! | Path | What is measured |
//! |------|------------------|
//! | Burst | Headers evaluated per second, per engine and burst size |
//! | Header | Canonical encoding and identity hash |
//! | Body | Body digest up to a full 5000-transaction block |

use criterion::{criterion_group, criterion_main, Criterion};
use miner_tests::benchmarks::mining;

fn bench_mining(c: &mut Criterion) {
    mining::register_benchmarks(c);
}

criterion_group!(benches, bench_mining);

criterion_main!(benches);
