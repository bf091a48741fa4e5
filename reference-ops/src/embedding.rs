//! Embedding-update reference kernels: t-distribution, sigmoid, force repulsion.
//!
//! Row `i` of `x` is the embedding being updated, row `j` of `y` the
//! neighbour selected by nonzero `(i, j)`; the per-edge contribution is
//! accumulated into row `i` of `out`.

use rayon::prelude::*;

use crate::real::Real;
use crate::sigmoid::{tdist_scale, SigmoidTable};
use crate::view::{CsrView, DenseMut, DenseRef};

/// Operand order of a row difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubtractOrder {
    /// `x_i - y_j`
    #[default]
    LhsMinusRhs,
    /// `y_j - x_i`
    RhsMinusLhs,
}

impl SubtractOrder {
    #[inline(always)]
    pub fn apply<T: Real>(self, lhs: T, rhs: T) -> T {
        match self {
            SubtractOrder::LhsMinusRhs => lhs - rhs,
            SubtractOrder::RhsMinusLhs => rhs - lhs,
        }
    }
}

/// t-distribution attraction:
/// `d = clamp(-2 / (1 + ||x_i - y_j||^2))`, `out_i += d * (x_i - y_j)`.
pub fn tdist_csr<T: Real>(
    s: &CsrView<'_, T>,
    m: usize,
    k: usize,
    x: DenseRef<'_, T>,
    y: DenseRef<'_, T>,
    mut out: DenseMut<'_, T>,
) {
    if m == 0 || k == 0 {
        return;
    }
    let ld = out.ld;
    let minus_two = T::from_f64(-2.0);
    out.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each_init(
            || vec![T::zero(); k],
            |t, (i, o)| {
                let xi = x.row(i, k);
                for e in s.row_range(i) {
                    let yj = y.row(s.col_index[e], k);
                    let mut attr = T::zero();
                    for kk in 0..k {
                        t[kk] = xi[kk] - yj[kk];
                        attr += t[kk] * t[kk];
                    }
                    let d = tdist_scale(minus_two / (T::one() + attr));
                    for kk in 0..k {
                        o[kk] += t[kk] * d;
                    }
                }
            },
        );
}

/// Sigmoid attraction: `d = sigmoid(x_i . y_j)`, `out_i += (1 - d) * y_j`.
pub fn sigmoid_csr<T: Real>(
    s: &CsrView<'_, T>,
    m: usize,
    k: usize,
    x: DenseRef<'_, T>,
    y: DenseRef<'_, T>,
    mut out: DenseMut<'_, T>,
    table: &SigmoidTable<T>,
) {
    if m == 0 || k == 0 {
        return;
    }
    let ld = out.ld;
    out.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each(|(i, o)| {
            let xi = x.row(i, k);
            for e in s.row_range(i) {
                let yj = y.row(s.col_index[e], k);
                let mut attr = T::zero();
                for kk in 0..k {
                    attr += xi[kk] * yj[kk];
                }
                let d = table.lookup(attr);
                let w = T::one() - d;
                for kk in 0..k {
                    o[kk] += w * yj[kk];
                }
            }
        });
}

/// Force-directed repulsion: `d = 1 + 1 / ||t||^2` with `t` the row
/// difference in the given order, `out_i += d * t`.
pub fn force_repulsion_csr<T: Real>(
    s: &CsrView<'_, T>,
    m: usize,
    k: usize,
    x: DenseRef<'_, T>,
    y: DenseRef<'_, T>,
    mut out: DenseMut<'_, T>,
    order: SubtractOrder,
) {
    if m == 0 || k == 0 {
        return;
    }
    let ld = out.ld;
    out.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each_init(
            || vec![T::zero(); k],
            |t, (i, o)| {
                let xi = x.row(i, k);
                for e in s.row_range(i) {
                    let yj = y.row(s.col_index[e], k);
                    let mut attr = T::zero();
                    for kk in 0..k {
                        t[kk] = order.apply(xi[kk], yj[kk]);
                        attr += t[kk] * t[kk];
                    }
                    let d = T::one() + T::one() / attr;
                    for kk in 0..k {
                        o[kk] += d * t[kk];
                    }
                }
            },
        );
}
