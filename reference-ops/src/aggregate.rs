//! Neighbour aggregation reference kernels (SpMM and GCN).

use rayon::prelude::*;

use crate::real::Real;
use crate::view::{CsrView, DenseMut, DenseRef};

/// Weighted aggregation: `out_i += w_ij * b_j`.
///
/// A view without values aggregates with unit weights.
pub fn spmm_csr<T: Real>(
    s: &CsrView<'_, T>,
    m: usize,
    k: usize,
    b: DenseRef<'_, T>,
    mut out: DenseMut<'_, T>,
) {
    if m == 0 || k == 0 {
        return;
    }
    let ld = out.ld;
    out.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each(|(i, o)| {
            for e in s.row_range(i) {
                let w = s.values.map_or(T::one(), |v| v[e]);
                let bj = b.row(s.col_index[e], k);
                for kk in 0..k {
                    o[kk] += w * bj[kk];
                }
            }
        });
}

/// Unweighted aggregation: `out_i += b_j`.
pub fn gcn_csr<T: Real>(
    s: &CsrView<'_, T>,
    m: usize,
    k: usize,
    b: DenseRef<'_, T>,
    mut out: DenseMut<'_, T>,
) {
    if m == 0 || k == 0 {
        return;
    }
    let ld = out.ld;
    out.rows_mut(m)
        .par_chunks_mut(ld)
        .enumerate()
        .for_each(|(i, o)| {
            for e in s.row_range(i) {
                let bj = b.row(s.col_index[e], k);
                for kk in 0..k {
                    o[kk] += bj[kk];
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcn_neighbour_sum() {
        let row_ptr = [0usize, 2, 3, 4];
        let cols = [1usize, 2, 0, 0];
        let s: CsrView<'_, f32> = CsrView::from_row_ptr(3, 3, 3, &row_ptr, &cols, None);
        let b = [1.0f32, 1.0, 2.0, 2.0, 3.0, 3.0];
        let mut c = [0.0f32; 6];
        gcn_csr(&s, 3, 2, DenseRef::new(&b, 2), DenseMut::new(&mut c, 2));
        assert_eq!(c, [5.0, 5.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_spmm_weights() {
        let row_ptr = [0usize, 2];
        let cols = [0usize, 1];
        let vals = [0.5f64, 2.0];
        let s = CsrView::from_row_ptr(1, 2, 1, &row_ptr, &cols, Some(&vals[..]));
        let b = [4.0f64, 8.0];
        let mut c = [1.0f64];
        spmm_csr(&s, 1, 1, DenseRef::new(&b, 1), DenseMut::new(&mut c, 1));
        assert_eq!(c, [1.0 + 2.0 + 16.0]);
    }
}
