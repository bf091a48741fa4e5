//! Steady-state vs cache-flushing timers on the same kernel.
//!
//! Reports the harness' own per-call figure next to criterion's wall time,
//! so the cold-cache penalty is visible per application.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

#[path = "utils.rs"]
mod utils;

use fusedmm_kernels::profiling::{PathRunner, TimerKind, TimingInputs};
use fusedmm_kernels::{ApplicationKernel, ApplicationKind, KernelDims, KernelPath, SigmoidTable, SubtractOrder};

const NODES: usize = 2048;
const DEGREE: usize = 8;
const K: usize = 64;

fn bench_timer_kinds(c: &mut Criterion) {
    let csr = utils::random_graph(NODES, DEGREE, 11);
    let table = SigmoidTable::<f32>::new();
    let mut group = c.benchmark_group("timers");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(4));

    for app in [ApplicationKind::Sigmoid, ApplicationKind::WeightedAggregation] {
        let kernel = ApplicationKernel::new(app, SubtractOrder::default(), &table);
        let inputs = TimingInputs {
            csr: &csr,
            dims: KernelDims { m: NODES, n: NODES, k: K },
            alpha: 1.0,
            beta: 0.0,
            nrep: 5,
            cache_bytes: 8 << 20,
            seed: 3,
        };
        for timer in [TimerKind::Steady, TimerKind::CacheFlushing] {
            let mut runner = PathRunner::new(&kernel, KernelPath::Fused);
            let id = BenchmarkId::new(timer.name(), app.name());
            group.bench_function(id, |bench| {
                bench.iter(|| {
                    let t = timer.time(&mut runner, &inputs).expect("timed run");
                    criterion::black_box(t.exec_secs)
                });
            });
            if let Ok(t) = timer.time(&mut runner, &inputs) {
                let flops = utils::fused_flops(app, csr.nnz(), K);
                eprintln!(
                    "{:>14} {:>8}: {:.3e} s/call, {:.2} GFLOP/s",
                    timer.name(),
                    app.name(),
                    t.exec_secs,
                    utils::gflops(flops, t.exec_secs)
                );
            }
        }
    }
    group.finish();
}

criterion_group!(timer_benches, bench_timer_kinds);
criterion_main!(timer_benches);
