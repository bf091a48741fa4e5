//! Correctness oracle: fused output vs. reference output.
//!
//! The tolerance is derived from an operation-count model instead of a fixed
//! epsilon. Each output element of an application costs a known number of
//! flops per neighbour (the per-edge SDDMM part plus the SpMM update), so
//! the worst-case absolute error grows with `max_row_degree * flops * eps`.
//! A safety factor of 2 covers errors in either direction.

use std::collections::BTreeMap;
use std::hint::black_box;

use crate::dense::{fill_uniform, seeded_rng};
use crate::error::{HarnessError, HarnessResult};
use crate::kernel_dispatcher::{ApplicationKernel, KernelCall, KernelDims, KernelPath};
use crate::kernel_types::ApplicationKind;
use crate::sparse::CsrMatrix;
use crate::workspace::{Arena, ArenaLayout};
use crate::{CsrView, DenseMut, DenseRef, Element};

/// Unit roundoff of `T`, found by halving until `1 + f == 1`.
pub fn machine_epsilon<T: Element>() -> T {
    let half = T::from_f64(0.5);
    let one = T::one();
    let mut f = half;
    loop {
        let eps = f;
        f = f * half;
        if black_box(one + f) == one {
            return eps;
        }
    }
}

/// Flops needed per neighbour for one output element: `per_dim * K + constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlopModel {
    pub per_dim: f64,
    pub constant: f64,
}

impl FlopModel {
    pub const fn new(per_dim: f64, constant: f64) -> Self {
        Self { per_dim, constant }
    }

    #[inline]
    pub fn flops(&self, k: usize) -> f64 {
        self.per_dim * k as f64 + self.constant
    }
}

/// Overridable tolerance model.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBoundPolicy {
    pub safety_factor: f64,
    models: BTreeMap<ApplicationKind, FlopModel>,
}

impl Default for ErrorBoundPolicy {
    fn default() -> Self {
        let models = BTreeMap::from([
            // dot (2K) + sigmoid (6) + scaled update (2K)
            (ApplicationKind::Sigmoid, FlopModel::new(4.0, 6.0)),
            // diff + norm (3K) + scale (2) + update (2K)
            (ApplicationKind::TDistribution, FlopModel::new(5.0, 2.0)),
            (ApplicationKind::ForceRepulsion, FlopModel::new(5.0, 2.0)),
            (ApplicationKind::WeightedAggregation, FlopModel::new(2.0, 0.0)),
            (ApplicationKind::UnweightedAggregation, FlopModel::new(1.0, 0.0)),
        ]);
        Self { safety_factor: 2.0, models }
    }
}

impl ErrorBoundPolicy {
    /// Policy with no per-application models; every tolerance uses the
    /// `4 * nnz` upper bound.
    pub fn upper_bound_only() -> Self {
        Self { safety_factor: 2.0, models: BTreeMap::new() }
    }

    pub fn with_model(mut self, app: ApplicationKind, model: FlopModel) -> Self {
        self.models.insert(app, model);
        self
    }

    pub fn without_model(mut self, app: ApplicationKind) -> Self {
        self.models.remove(&app);
        self
    }

    pub fn with_safety_factor(mut self, factor: f64) -> Self {
        self.safety_factor = factor;
        self
    }

    pub fn model(&self, app: ApplicationKind) -> Option<FlopModel> {
        self.models.get(&app).copied()
    }

    /// Absolute tolerance for one output element.
    pub fn tolerance(&self, app: ApplicationKind, max_row_degree: usize, k: usize, nnz: usize, eps: f64) -> f64 {
        match self.model(app) {
            Some(model) => self.safety_factor * max_row_degree as f64 * model.flops(k) * eps,
            None => self.safety_factor * 4.0 * nnz as f64 * eps,
        }
    }
}

/// A single out-of-tolerance output element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub expected: f64,
    pub actual: f64,
    pub diff: f64,
}

/// Outcome of one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub checked: usize,
    pub mismatches: usize,
    pub tolerance: f64,
    pub epsilon: f64,
    pub first: Option<Mismatch>,
}

impl CheckReport {
    #[inline]
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

/// Compare the `m x k` region of two row-major outputs with stride `ldc`.
///
/// An element fails when `|expected - actual| > tolerance` or when `actual`
/// is NaN. Only the first failure is reported in detail.
pub fn compare_outputs<T: Element>(
    expected: &[T],
    actual: &[T],
    m: usize,
    k: usize,
    ldc: usize,
    tolerance: f64,
) -> CheckReport {
    let mut mismatches = 0usize;
    let mut first = None;
    for i in 0..m {
        for j in 0..k {
            let idx = i * ldc + j;
            let (e, a) = (expected[idx], actual[idx]);
            let diff = (e - a).abs().to_f64();
            if diff > tolerance || a.is_nan() {
                if first.is_none() {
                    log::warn!(
                        "C({i},{j}) : expected={:e}, got={:e}, diff={diff:e}, bound={tolerance:e}",
                        e.to_f64(),
                        a.to_f64()
                    );
                    first = Some(Mismatch { row: i, col: j, expected: e.to_f64(), actual: a.to_f64(), diff });
                }
                mismatches += 1;
            }
        }
    }
    CheckReport {
        checked: m * k,
        mismatches,
        tolerance,
        epsilon: machine_epsilon::<T>().to_f64(),
        first,
    }
}

/// Run the reference and fused paths on identical random inputs and compare.
///
/// A, B and the nonzero values are uniform `[0, 1)`; both outputs start at
/// zero. Leading dimensions are `K`.
pub fn run_correctness_check<T: Element>(
    kernel: &ApplicationKernel<'_, T>,
    csr: &CsrMatrix<T>,
    dims: KernelDims,
    alpha: T,
    beta: T,
    policy: &ErrorBoundPolicy,
    seed: u64,
) -> HarnessResult<CheckReport> {
    let KernelDims { m, n, k } = dims;
    if m > csr.rows() {
        return Err(HarnessError::dims(format!("M={m} exceeds the matrix's {} rows", csr.rows())));
    }
    if n < csr.cols() {
        return Err(HarnessError::dims(format!("N={n} is below the matrix's {} columns", csr.cols())));
    }
    let mut rng = seeded_rng(seed);

    let mut layout = ArenaLayout::<T>::new();
    let ra = layout.reserve(m * k);
    let rb = layout.reserve(n * k);
    let rv = layout.reserve(csr.nnz());
    let rc_trusted = layout.reserve(m * k);
    let rc_test = layout.reserve(m * k);
    let mut arena = Arena::new(&layout, 1)?;
    for r in [ra, rb, rv] {
        fill_uniform(&mut rng, arena.region_mut(0, r));
    }

    let (inputs, c_trusted) = arena.split_output(0, rc_trusted);
    let call = KernelCall {
        dims,
        alpha,
        beta,
        s: CsrView::from_row_ptr(csr.rows(), csr.cols(), m, csr.row_ptr(), csr.col_index(), Some(inputs.get(rv))),
        a: DenseRef::new(inputs.get(ra), k),
        b: DenseRef::new(inputs.get(rb), k),
    };
    log::info!("applying trusted {} kernel", kernel.application());
    kernel.run(KernelPath::Trusted, &call, DenseMut::new(c_trusted, k))?;

    let (inputs, c_test) = arena.split_output(0, rc_test);
    let call = KernelCall {
        dims,
        alpha,
        beta,
        s: CsrView::from_row_ptr(csr.rows(), csr.cols(), m, csr.row_ptr(), csr.col_index(), Some(inputs.get(rv))),
        a: DenseRef::new(inputs.get(ra), k),
        b: DenseRef::new(inputs.get(rb), k),
    };
    log::info!("applying fused {} kernel", kernel.application());
    kernel.run(KernelPath::Fused, &call, DenseMut::new(c_test, k))?;

    let eps = machine_epsilon::<T>().to_f64();
    let tolerance = policy.tolerance(kernel.application(), csr.max_row_degree(m), k, csr.nnz(), eps);
    log::debug!("eps={eps:e}, tolerance={tolerance:e}");
    Ok(compare_outputs(
        arena.region(0, rc_trusted),
        arena.region(0, rc_test),
        m,
        k,
        k,
        tolerance,
    ))
}
