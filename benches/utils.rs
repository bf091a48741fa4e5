#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fusedmm_kernels::{ApplicationKind, CsrMatrix};

/// Random graph with exactly `degree` distinct neighbours per row (sorted).
pub fn random_graph(n: usize, degree: usize, seed: u64) -> CsrMatrix<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let degree = degree.min(n);
    let mut row_ptr = Vec::with_capacity(n + 1);
    let mut col_index = Vec::with_capacity(n * degree);
    row_ptr.push(0);
    for _ in 0..n {
        let mut row: Vec<usize> = rand::seq::index::sample(&mut rng, n, degree).into_vec();
        row.sort_unstable();
        col_index.extend(row);
        row_ptr.push(col_index.len());
    }
    let values = (0..col_index.len()).map(|_| rng.gen::<f32>()).collect();
    CsrMatrix::new(n, n, row_ptr, col_index, values).expect("valid random graph")
}

/// Floating-point operations of one fused call.
pub fn fused_flops(app: ApplicationKind, nnz: usize, k: usize) -> u64 {
    let per_edge = match app {
        ApplicationKind::TDistribution | ApplicationKind::ForceRepulsion => 5 * k + 2,
        ApplicationKind::Sigmoid => 4 * k + 6,
        ApplicationKind::WeightedAggregation => 2 * k,
        ApplicationKind::UnweightedAggregation => k,
    };
    (per_edge * nnz) as u64
}

/// GFLOP/s for a per-call time.
pub fn gflops(flops: u64, secs: f64) -> f64 {
    flops as f64 / secs / 1e9
}
