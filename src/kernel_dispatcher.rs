//! Fused SDDMM+SpMM dispatcher and the per-application kernel binding.
//!
//! [`fused_mm_csr`] interprets an [`OpMessage`] edge by edge: the sampled
//! per-edge quantity is produced and folded into the output row in the same
//! step, so no `nnz`-sized intermediate is ever materialised. Rows are
//! split across the rayon pool; each task owns its output row and a private
//! temporary of length K.
//!
//! [`ApplicationKernel`] binds an application to both its stage message and
//! its reference implementation so timers and the oracle can call either
//! path through one interface.

use rayon::prelude::*;

use fusedmm_reference::{SigmoidTable, SubtractOrder};

use crate::error::{HarnessError, HarnessResult};
use crate::kernel_types::{ApplicationKind, OpMessage, ReduceOp, ScalarOp, VectorOp, VectorScaleOp};
use crate::trusted;
use crate::udf::{ScalarFunction, ScalarFunctionKind, ScalarUdf};
use crate::validation::{validate_dense_len, validate_kernel_dims};
use crate::{CsrView, DenseMut, DenseRef, Real};

/// Problem shape: `C (m x k) += f(S (m x n), A (m x k), B (n x k))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelDims {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

/// Read-only arguments shared by the fused and reference paths.
///
/// `alpha` and `beta` are carried for interface compatibility; neither path
/// applies them, the output is always accumulated into.
#[derive(Debug, Clone, Copy)]
pub struct KernelCall<'a, T> {
    pub dims: KernelDims,
    pub alpha: T,
    pub beta: T,
    pub s: CsrView<'a, T>,
    pub a: DenseRef<'a, T>,
    pub b: DenseRef<'a, T>,
}

impl<'a, T: Real> KernelCall<'a, T> {
    /// O(1) shape checks against the output operand.
    pub fn validate(&self, c: &DenseMut<'_, T>) -> HarnessResult<()> {
        let KernelDims { m, n, k } = self.dims;
        validate_kernel_dims(m, n, k).map_err(HarnessError::InvalidDimensions)?;
        if m > self.s.addressable_rows() {
            return Err(HarnessError::dims(format!(
                "M={m} exceeds the {} rows the sparse view addresses",
                self.s.addressable_rows()
            )));
        }
        if self.s.cols > n {
            return Err(HarnessError::dims(format!(
                "sparse matrix has {} columns but B only {n} rows",
                self.s.cols
            )));
        }
        if let Some(values) = self.s.values {
            if values.len() < self.s.nnz {
                return Err(HarnessError::dims(format!(
                    "values len {} < nnz {}",
                    values.len(),
                    self.s.nnz
                )));
            }
        }
        validate_dense_len(self.a.data.len(), m, self.a.ld, k, "A").map_err(HarnessError::InvalidDimensions)?;
        validate_dense_len(self.b.data.len(), n, self.b.ld, k, "B").map_err(HarnessError::InvalidDimensions)?;
        validate_dense_len(c.data.len(), m, c.ld, k, "C").map_err(HarnessError::InvalidDimensions)?;
        Ok(())
    }
}

/// Generic fused kernel: runs the five stages of `msg` for every nonzero of
/// the first `m` rows and accumulates into `c`.
pub fn fused_mm_csr<T, U>(
    msg: OpMessage,
    udf: &U,
    call: &KernelCall<'_, T>,
    mut c: DenseMut<'_, T>,
) -> HarnessResult<()>
where
    T: Real,
    U: ScalarUdf<T> + ?Sized,
{
    call.validate(&c)?;
    let KernelDims { m, k, .. } = call.dims;
    let ld = c.ld;
    let tmp_len = if msg.uses_row_temporary() { k } else { 0 };
    let s = &call.s;
    let (a, b) = (call.a, call.b);

    c.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each_init(
            || vec![T::zero(); tmp_len],
            |t, (i, ci)| fused_row(&msg, udf, s, i, a.row(i, k), b, k, &mut ci[..k], t),
        );
    Ok(())
}

#[inline(always)]
#[allow(clippy::too_many_arguments)]
fn fused_row<T, U>(
    msg: &OpMessage,
    udf: &U,
    s: &CsrView<'_, T>,
    i: usize,
    ai: &[T],
    b: DenseRef<'_, T>,
    k: usize,
    ci: &mut [T],
    t: &mut [T],
) where
    T: Real,
    U: ScalarUdf<T> + ?Sized,
{
    for e in s.row_range(i) {
        let bj = b.row(s.col_index[e], k);

        let v: &[T] = match msg.vop {
            VectorOp::Subtract(order) => {
                for kk in 0..k {
                    t[kk] = order.apply(ai[kk], bj[kk]);
                }
                &*t
            }
            VectorOp::CopyRhs => {
                t.copy_from_slice(bj);
                &*t
            }
            VectorOp::NoOp => bj,
        };

        let mut scalar = s.values.map_or(T::one(), |w| w[e]);
        match msg.rop {
            ReduceOp::SquaredNorm => {
                let mut acc = T::zero();
                for &x in v {
                    acc += x * x;
                }
                scalar = acc;
            }
            ReduceOp::Dot => {
                let mut acc = T::zero();
                for kk in 0..k {
                    acc += ai[kk] * bj[kk];
                }
                scalar = acc;
            }
            ReduceOp::NoOp => {}
        }

        match msg.sop {
            ScalarOp::UserDefined => scalar = udf.apply(scalar),
            ScalarOp::Copy | ScalarOp::NoOp => {}
        }

        // AccumulateOp::Add is the only accumulate stage.
        match msg.vsc {
            VectorScaleOp::Multiply => {
                for kk in 0..k {
                    ci[kk] += scalar * v[kk];
                }
            }
            VectorScaleOp::NoOp => {
                for kk in 0..k {
                    ci[kk] += v[kk];
                }
            }
        }
    }
}

/// Which implementation of an application to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelPath {
    /// Unfused reference kernel.
    Trusted,
    /// Fused dispatcher.
    Fused,
}

impl KernelPath {
    pub fn label(self) -> &'static str {
        match self {
            KernelPath::Trusted => "trusted",
            KernelPath::Fused => "fused",
        }
    }
}

/// An application bound to its stage message, scalar function and
/// reference kernel for one run.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationKernel<'t, T> {
    app: ApplicationKind,
    order: SubtractOrder,
    msg: OpMessage,
    udf: ScalarFunction<'t, T>,
    table: &'t SigmoidTable<T>,
}

impl<'t, T: Real> ApplicationKernel<'t, T> {
    pub fn new(app: ApplicationKind, order: SubtractOrder, table: &'t SigmoidTable<T>) -> Self {
        let msg = app.message(order);
        let udf = ScalarFunction::for_application(app, table);
        log::debug!("{app}: {msg}, scalar function {}", udf.name());
        Self { app, order, msg, udf, table }
    }

    /// Kernel for `app` whose fused scalar stage runs `kind` instead of the
    /// application's own function. Only the fused path is defined when
    /// `kind` differs from it.
    pub fn with_udf(
        app: ApplicationKind,
        order: SubtractOrder,
        table: &'t SigmoidTable<T>,
        kind: ScalarFunctionKind,
    ) -> HarnessResult<Self> {
        let mut kernel = Self::new(app, order, table);
        if kind == kernel.udf.kind() {
            return Ok(kernel);
        }
        if kernel.msg.sop != ScalarOp::UserDefined {
            return Err(HarnessError::InvalidConfig(format!(
                "{app} has no user-defined scalar stage for {}",
                kind.tag()
            )));
        }
        kernel.udf = kind.bind(table);
        log::debug!("{app}: scalar function overridden to {}", kernel.udf.name());
        Ok(kernel)
    }

    /// Whether the trusted kernel computes the same function as the fused path.
    #[inline]
    pub fn has_reference(&self) -> bool {
        self.udf.kind() == ScalarFunctionKind::for_application(self.app)
    }

    #[inline]
    pub fn application(&self) -> ApplicationKind {
        self.app
    }

    #[inline]
    pub fn message(&self) -> OpMessage {
        self.msg
    }

    pub fn run(&self, path: KernelPath, call: &KernelCall<'_, T>, c: DenseMut<'_, T>) -> HarnessResult<()> {
        match path {
            KernelPath::Trusted if !self.has_reference() => Err(HarnessError::InvalidConfig(format!(
                "no trusted {} kernel with scalar function {}",
                self.app,
                self.udf.name()
            ))),
            KernelPath::Trusted => trusted::run_trusted(self.app, self.order, self.table, call, c),
            KernelPath::Fused => fused_mm_csr(self.msg, &self.udf, call, c),
        }
    }
}
