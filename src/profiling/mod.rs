//! Kernel timing: steady-state and cache-flushing timers.
//!
//! Both timers build their own random working set, call a [`KernelRunner`]
//! `nrep` times and report `[setup, per-call]` seconds. The steady-state
//! timer reuses one working set after a warm-up call, so it measures
//! cache-resident throughput. The cache-flushing timer rotates through
//! enough physically distinct replicas of the working set to overflow the
//! given cache, so every call starts cold.
//!
//! # Example
//!
//! ```rust,no_run
//! use fusedmm_kernels::profiling::{TimerKind, TimingInputs, PathRunner};
//! use fusedmm_kernels::{ApplicationKernel, ApplicationKind, KernelDims, KernelPath, SigmoidTable};
//! # fn demo(csr: &fusedmm_kernels::sparse::CsrMatrix<f32>) -> fusedmm_kernels::HarnessResult<()> {
//! let table = SigmoidTable::new();
//! let kernel = ApplicationKernel::new(ApplicationKind::Sigmoid, Default::default(), &table);
//! let inputs = TimingInputs {
//!     csr,
//!     dims: KernelDims { m: csr.rows(), n: csr.cols(), k: 128 },
//!     alpha: 1.0,
//!     beta: 0.0,
//!     nrep: 20,
//!     cache_bytes: 25344 * 1024,
//!     seed: 0,
//! };
//! let mut runner = PathRunner::new(&kernel, KernelPath::Fused);
//! let t = TimerKind::CacheFlushing.time(&mut runner, &inputs)?;
//! println!("{:e} s/call", t.exec_secs);
//! # Ok(()) }
//! ```

pub mod replica;
pub mod report;
pub mod timer;

use crate::dense::{fill_uniform, seeded_rng};
use crate::error::{HarnessError, HarnessResult};
use crate::kernel_dispatcher::{ApplicationKernel, KernelCall, KernelDims, KernelPath};
use crate::sparse::CsrMatrix;
use crate::workspace::Arena;
use crate::{CsrView, DenseMut, DenseRef, Element};

use replica::{replica_count, IndexSetLayout, ReplicaRotation, ValueSetLayout};
use timer::{time_once, WallTimer};

/// `[setup, per-call execution]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Timing {
    pub setup_secs: f64,
    pub exec_secs: f64,
}

impl Timing {
    pub fn as_pair(&self) -> [f64; 2] {
        [self.setup_secs, self.exec_secs]
    }
}

/// Something a timer can call repeatedly.
pub trait KernelRunner<T: Element> {
    fn label(&self) -> &str;

    /// One-off inspection before the timed loop; its duration is reported
    /// as setup time.
    fn inspect(&mut self, _call: &KernelCall<'_, T>) -> HarnessResult<()> {
        Ok(())
    }

    fn run(&self, call: &KernelCall<'_, T>, c: DenseMut<'_, T>) -> HarnessResult<()>;
}

/// Runs one path of an [`ApplicationKernel`].
pub struct PathRunner<'k, 't, T> {
    kernel: &'k ApplicationKernel<'t, T>,
    path: KernelPath,
}

impl<'k, 't, T: Element> PathRunner<'k, 't, T> {
    pub fn new(kernel: &'k ApplicationKernel<'t, T>, path: KernelPath) -> Self {
        Self { kernel, path }
    }
}

impl<'k, 't, T: Element> KernelRunner<T> for PathRunner<'k, 't, T> {
    fn label(&self) -> &str {
        self.path.label()
    }

    fn run(&self, call: &KernelCall<'_, T>, c: DenseMut<'_, T>) -> HarnessResult<()> {
        self.kernel.run(self.path, call, c)
    }
}

/// Everything a timer needs besides the runner.
#[derive(Debug, Clone, Copy)]
pub struct TimingInputs<'a, T> {
    pub csr: &'a CsrMatrix<T>,
    pub dims: KernelDims,
    pub alpha: T,
    pub beta: T,
    pub nrep: usize,
    /// Size of the cache to defeat.
    pub cache_bytes: usize,
    pub seed: u64,
}

impl<'a, T: Element> TimingInputs<'a, T> {
    fn check(&self) -> HarnessResult<()> {
        if self.nrep == 0 {
            return Err(HarnessError::InvalidConfig("nrep must be at least 1".into()));
        }
        if self.dims.m > self.csr.rows() {
            return Err(HarnessError::dims(format!(
                "M={} exceeds {} sparse rows",
                self.dims.m,
                self.csr.rows()
            )));
        }
        Ok(())
    }
}

/// Timer strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerKind {
    /// Rotating oversized replicas, no warm-up.
    #[default]
    CacheFlushing,
    /// Warm-up call, then the same buffers every repetition.
    Steady,
}

impl TimerKind {
    pub fn time<T: Element, R: KernelRunner<T>>(
        self,
        runner: &mut R,
        inputs: &TimingInputs<'_, T>,
    ) -> HarnessResult<Timing> {
        match self {
            TimerKind::CacheFlushing => time_cache_flushing(runner, inputs),
            TimerKind::Steady => time_steady(runner, inputs),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimerKind::CacheFlushing => "cache-flushing",
            TimerKind::Steady => "steady",
        }
    }

    /// `cf` / `steady`, or the full name.
    pub fn from_tag(tag: &str) -> HarnessResult<Self> {
        match tag {
            "cf" | "cache-flushing" => Ok(TimerKind::CacheFlushing),
            "steady" => Ok(TimerKind::Steady),
            other => Err(HarnessError::InvalidConfig(format!("unknown timer {other:?}"))),
        }
    }
}

/// Cache-resident timing: one untimed warm-up, then `nrep` calls on the
/// same buffers.
pub fn time_steady<T: Element, R: KernelRunner<T>>(
    runner: &mut R,
    inputs: &TimingInputs<'_, T>,
) -> HarnessResult<Timing> {
    inputs.check()?;
    let TimingInputs { csr, dims, alpha, beta, nrep, seed, .. } = *inputs;
    let k = dims.k;
    let set = ValueSetLayout::<T>::new(dims, csr.nnz());
    let mut arena = Arena::new(&set.layout, 1)?;
    let mut rng = seeded_rng(seed);
    for r in [set.a, set.b, set.c, set.values] {
        fill_uniform(&mut rng, arena.region_mut(0, r));
    }

    let (data, c) = arena.split_output(0, set.c);
    let call = KernelCall {
        dims,
        alpha,
        beta,
        s: CsrView::from_row_ptr(csr.rows(), csr.cols(), dims.m, csr.row_ptr(), csr.col_index(), Some(data.get(set.values))),
        a: DenseRef::new(data.get(set.a), k),
        b: DenseRef::new(data.get(set.b), k),
    };

    let (inspected, setup_secs) = time_once(|| runner.inspect(&call));
    inspected?;
    runner.run(&call, DenseMut::new(&mut *c, k))?;

    let t = WallTimer::start();
    for _ in 0..nrep {
        runner.run(&call, DenseMut::new(&mut *c, k))?;
    }
    let exec_secs = t.elapsed_secs() / nrep as f64;
    log::debug!("{} steady: {exec_secs:e} s/call over {nrep} reps", runner.label());
    Ok(Timing { setup_secs, exec_secs })
}

/// Out-of-cache timing over rotating replicas of the working set.
///
/// Value data (A, B, C, nonzero values) get fresh random contents per
/// replica; index data (row pointers, column indices) are copies of the
/// matrix structure.
pub fn time_cache_flushing<T: Element, R: KernelRunner<T>>(
    runner: &mut R,
    inputs: &TimingInputs<'_, T>,
) -> HarnessResult<Timing> {
    inputs.check()?;
    let TimingInputs { csr, dims, alpha, beta, nrep, cache_bytes, seed } = *inputs;
    let (m, k) = (dims.m, dims.k);

    let vset = ValueSetLayout::<T>::new(dims, csr.nnz());
    let iset = IndexSetLayout::new(m, csr.nnz());
    let ndsets = replica_count(cache_bytes, vset.layout.stride_bytes());
    let nisets = replica_count(cache_bytes, iset.layout.stride_bytes());
    log::debug!(
        "cache flush: {ndsets} value sets x {} B, {nisets} index sets x {} B, cache {cache_bytes} B",
        vset.layout.stride_bytes(),
        iset.layout.stride_bytes()
    );

    let mut values = Arena::new(&vset.layout, ndsets)?;
    let mut rng = seeded_rng(seed);
    for d in 0..ndsets {
        for r in [vset.a, vset.b, vset.c, vset.values] {
            fill_uniform(&mut rng, values.region_mut(d, r));
        }
    }
    let mut indices = Arena::new(&iset.layout, nisets)?;
    for i in 0..nisets {
        indices.region_mut(i, iset.row_ptr).copy_from_slice(&csr.row_ptr()[..=m]);
        indices.region_mut(i, iset.col_index).copy_from_slice(csr.col_index());
    }
    let mut rotation = ReplicaRotation::new(ndsets, values.stride(), nisets, indices.stride());

    let setup_secs = {
        let (data, _) = values.split_output(0, vset.c);
        let call = replica_call(csr, dims, alpha, beta, &vset, &data, &iset, &indices, indices.replica_offset(0));
        let (inspected, secs) = time_once(|| runner.inspect(&call));
        inspected?;
        secs
    };

    let t = WallTimer::start();
    for _ in 0..nrep {
        let picked = rotation.advance();
        let (data_base, index_base) = rotation.offsets(picked);
        let (data, c) = values.split_output_at(data_base, vset.c);
        let call = replica_call(csr, dims, alpha, beta, &vset, &data, &iset, &indices, index_base);
        runner.run(&call, DenseMut::new(c, k))?;
    }
    let exec_secs = t.elapsed_secs() / nrep as f64;
    log::debug!("{} cache-flushing: {exec_secs:e} s/call over {nrep} reps", runner.label());
    Ok(Timing { setup_secs, exec_secs })
}

#[allow(clippy::too_many_arguments)]
fn replica_call<'a, T: Element>(
    csr: &CsrMatrix<T>,
    dims: KernelDims,
    alpha: T,
    beta: T,
    vset: &ValueSetLayout<T>,
    data: &crate::workspace::Carved<'a, T>,
    iset: &IndexSetLayout,
    indices: &'a Arena<usize>,
    index_base: usize,
) -> KernelCall<'a, T> {
    KernelCall {
        dims,
        alpha,
        beta,
        s: CsrView::from_row_ptr(
            csr.rows(),
            csr.cols(),
            dims.m,
            indices.region_at(index_base, iset.row_ptr),
            indices.region_at(index_base, iset.col_index),
            Some(data.get(vset.values)),
        ),
        a: DenseRef::new(data.get(vset.a), dims.k),
        b: DenseRef::new(data.get(vset.b), dims.k),
    }
}
