//! Borrowed views shared by the reference and fused kernels.

/// Read-only CSR structure restricted to the rows a kernel call touches.
///
/// Row `i` owns nonzeros `row_start[i]..row_end[i]`. Building the view from
/// a single `row_ptr` array uses `row_start = &row_ptr[..m]` and
/// `row_end = &row_ptr[1..=m]`.
#[derive(Debug, Clone, Copy)]
pub struct CsrView<'a, T> {
    pub rows: usize,
    pub cols: usize,
    pub nnz: usize,
    pub row_start: &'a [usize],
    pub row_end: &'a [usize],
    pub col_index: &'a [usize],
    /// Edge weights; `None` for structure-only graphs.
    pub values: Option<&'a [T]>,
}

impl<'a, T> CsrView<'a, T> {
    /// View over the first `m` rows of a `row_ptr`-style CSR.
    pub fn from_row_ptr(
        rows: usize,
        cols: usize,
        m: usize,
        row_ptr: &'a [usize],
        col_index: &'a [usize],
        values: Option<&'a [T]>,
    ) -> Self {
        Self {
            rows,
            cols,
            nnz: col_index.len(),
            row_start: &row_ptr[..m],
            row_end: &row_ptr[1..=m],
            col_index,
            values,
        }
    }

    /// Nonzero range of row `i`.
    #[inline(always)]
    pub fn row_range(&self, i: usize) -> std::ops::Range<usize> {
        self.row_start[i]..self.row_end[i]
    }

    /// Number of rows the view can address.
    #[inline]
    pub fn addressable_rows(&self) -> usize {
        self.row_start.len().min(self.row_end.len())
    }
}

/// Row-major dense operand, `ld` elements between consecutive rows.
#[derive(Debug, Clone, Copy)]
pub struct DenseRef<'a, T> {
    pub data: &'a [T],
    pub ld: usize,
}

impl<'a, T> DenseRef<'a, T> {
    pub fn new(data: &'a [T], ld: usize) -> Self {
        Self { data, ld }
    }

    /// First `k` entries of row `i`.
    #[inline(always)]
    pub fn row(&self, i: usize, k: usize) -> &'a [T] {
        let base = i * self.ld;
        &self.data[base..base + k]
    }
}

/// Row-major dense output.
#[derive(Debug)]
pub struct DenseMut<'a, T> {
    pub data: &'a mut [T],
    pub ld: usize,
}

impl<'a, T> DenseMut<'a, T> {
    pub fn new(data: &'a mut [T], ld: usize) -> Self {
        Self { data, ld }
    }

    /// The first `m` full rows, ready for `par_chunks_mut(ld)`.
    #[inline]
    pub fn rows_mut(&mut self, m: usize) -> &mut [T] {
        let end = (m * self.ld).min(self.data.len());
        &mut self.data[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_row_ptr() {
        let row_ptr = [0usize, 2, 3, 4];
        let col_index = [1usize, 2, 0, 0];
        let v: CsrView<'_, f32> = CsrView::from_row_ptr(3, 3, 2, &row_ptr, &col_index, None);
        assert_eq!(v.addressable_rows(), 2);
        assert_eq!(v.row_range(0), 0..2);
        assert_eq!(v.row_range(1), 2..3);
        assert_eq!(v.nnz, 4);
    }

    #[test]
    fn test_dense_row() {
        let data = [1.0f32, 2.0, 9.0, 3.0, 4.0, 9.0];
        let d = DenseRef::new(&data, 3);
        assert_eq!(d.row(1, 2), &[3.0, 4.0]);
    }
}
