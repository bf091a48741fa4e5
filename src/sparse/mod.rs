//! Owned sparse matrices (CSR and CSC) and the Matrix Market loader.
//!
//! The loader produces CSC; the harness sorts it, converts to CSR and sorts
//! again, then hands out borrowed [`CsrView`]s to kernels. Matrices are
//! immutable once validated.

pub mod mtx;

use crate::error::{HarnessError, HarnessResult};
use crate::validation::{validate_csr_structure, validate_values_len};
use crate::{CsrView, Real};

pub use mtx::read_matrix_market;

/// Compressed sparse row matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_index: Vec<usize>,
    values: Vec<T>,
}

impl<T: Real> CsrMatrix<T> {
    /// Build and validate a CSR matrix. `values` must hold one entry per nonzero.
    pub fn new(
        rows: usize,
        cols: usize,
        row_ptr: Vec<usize>,
        col_index: Vec<usize>,
        values: Vec<T>,
    ) -> HarnessResult<Self> {
        let csr = Self { rows, cols, row_ptr, col_index, values };
        csr.validate()?;
        Ok(csr)
    }

    /// Check the CSR invariants: monotone `row_ptr` ending at `nnz`, column
    /// indices below `cols`, one value per nonzero.
    pub fn validate(&self) -> HarnessResult<()> {
        validate_csr_structure(self.rows, self.cols, &self.row_ptr, &self.col_index)
            .and_then(|_| validate_values_len(self.values.len(), self.col_index.len()))
            .map_err(HarnessError::InvalidSparse)
    }

    /// Structure-only matrix with unit weights.
    pub fn from_pattern(
        rows: usize,
        cols: usize,
        row_ptr: Vec<usize>,
        col_index: Vec<usize>,
    ) -> HarnessResult<Self> {
        let values = vec![T::one(); col_index.len()];
        Self::new(rows, cols, row_ptr, col_index, values)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_index.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_index(&self) -> &[usize] {
        &self.col_index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Replace the nonzero values, keeping the structure.
    pub fn set_values(&mut self, values: Vec<T>) -> HarnessResult<()> {
        validate_values_len(values.len(), self.nnz()).map_err(HarnessError::InvalidSparse)?;
        self.values = values;
        Ok(())
    }

    #[inline]
    pub fn row_degree(&self, i: usize) -> usize {
        self.row_ptr[i + 1] - self.row_ptr[i]
    }

    /// Largest row degree among the first `m` rows.
    pub fn max_row_degree(&self, m: usize) -> usize {
        (0..m.min(self.rows)).map(|i| self.row_degree(i)).max().unwrap_or(0)
    }

    /// Borrowed view over the first `m` rows (clamped to `rows`).
    pub fn view(&self, m: usize) -> CsrView<'_, T> {
        let m = m.min(self.rows);
        CsrView::from_row_ptr(
            self.rows,
            self.cols,
            m,
            &self.row_ptr,
            &self.col_index,
            Some(&self.values),
        )
    }

    /// Sort the column indices of every row, carrying values along.
    pub fn sort_indices(&mut self) {
        sort_segments(&self.row_ptr, &mut self.col_index, &mut self.values);
    }

    /// True when every row lists its columns in strictly increasing order.
    pub fn has_sorted_indices(&self) -> bool {
        segments_sorted(&self.row_ptr, &self.col_index)
    }
}

/// Compressed sparse column matrix, as produced by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T> {
    rows: usize,
    cols: usize,
    col_ptr: Vec<usize>,
    row_index: Vec<usize>,
    values: Vec<T>,
}

impl<T: Real> CscMatrix<T> {
    /// Build from `(row, col, value)` triplets in any order.
    pub fn from_triplets(rows: usize, cols: usize, entries: &[(usize, usize, T)]) -> HarnessResult<Self> {
        let mut col_ptr = vec![0usize; cols + 1];
        for &(r, c, _) in entries {
            if r >= rows || c >= cols {
                return Err(HarnessError::InvalidSparse(format!(
                    "entry ({r}, {c}) outside {rows}x{cols}"
                )));
            }
            col_ptr[c + 1] += 1;
        }
        for c in 0..cols {
            col_ptr[c + 1] += col_ptr[c];
        }
        let nnz = entries.len();
        let mut next = col_ptr.clone();
        let mut row_index = vec![0usize; nnz];
        let mut values = vec![T::zero(); nnz];
        for &(r, c, v) in entries {
            let slot = next[c];
            row_index[slot] = r;
            values[slot] = v;
            next[c] += 1;
        }
        Ok(Self { rows, cols, col_ptr, row_index, values })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.row_index.len()
    }

    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    pub fn row_index(&self) -> &[usize] {
        &self.row_index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Sort the row indices of every column, carrying values along.
    pub fn sort_indices(&mut self) {
        sort_segments(&self.col_ptr, &mut self.row_index, &mut self.values);
    }

    /// Transpose the storage order. Columns are visited in increasing order,
    /// so every CSR row comes out sorted when this matrix is sorted.
    pub fn to_csr(&self) -> HarnessResult<CsrMatrix<T>> {
        let nnz = self.nnz();
        let mut row_ptr = vec![0usize; self.rows + 1];
        for &r in &self.row_index {
            row_ptr[r + 1] += 1;
        }
        for r in 0..self.rows {
            row_ptr[r + 1] += row_ptr[r];
        }
        let mut next = row_ptr.clone();
        let mut col_index = vec![0usize; nnz];
        let mut values = vec![T::zero(); nnz];
        for c in 0..self.cols {
            for e in self.col_ptr[c]..self.col_ptr[c + 1] {
                let r = self.row_index[e];
                let slot = next[r];
                col_index[slot] = c;
                values[slot] = self.values[e];
                next[r] += 1;
            }
        }
        CsrMatrix::new(self.rows, self.cols, row_ptr, col_index, values)
    }
}

fn sort_segments<T: Copy>(ptr: &[usize], index: &mut [usize], values: &mut [T]) {
    let mut scratch: Vec<(usize, T)> = Vec::new();
    for w in ptr.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if segment_sorted(&index[lo..hi]) {
            continue;
        }
        scratch.clear();
        scratch.extend(index[lo..hi].iter().copied().zip(values[lo..hi].iter().copied()));
        scratch.sort_by_key(|&(i, _)| i);
        for (dst, &(i, v)) in scratch.iter().enumerate() {
            index[lo + dst] = i;
            values[lo + dst] = v;
        }
    }
}

fn segment_sorted(seg: &[usize]) -> bool {
    seg.windows(2).all(|p| p[0] < p[1])
}

fn segments_sorted(ptr: &[usize], index: &[usize]) -> bool {
    ptr.windows(2).all(|w| segment_sorted(&index[w[0]..w[1]]))
}
