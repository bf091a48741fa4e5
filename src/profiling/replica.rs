//! Working-set replication for the cache-flushing timer.
//!
//! The value-typed data (A, B, C, nonzero values) and the index-typed data
//! (row pointers, column indices) are replicated separately, each enough
//! times that the replicas together exceed the cache being defeated.
//! Repetitions walk the replicas with a decrementing cursor, so by the time
//! a replica is reused every other one has evicted it.

use crate::kernel_dispatcher::KernelDims;
use crate::workspace::{ArenaLayout, Region};

/// Copies needed so that `count * footprint >= cache_bytes`; at least one.
pub fn replica_count(cache_bytes: usize, footprint_bytes: usize) -> usize {
    if footprint_bytes == 0 {
        return 1;
    }
    cache_bytes.div_ceil(footprint_bytes).max(1)
}

/// Layout of one value-typed replica.
#[derive(Debug, Clone)]
pub struct ValueSetLayout<T> {
    pub layout: ArenaLayout<T>,
    pub a: Region,
    pub b: Region,
    pub c: Region,
    pub values: Region,
}

impl<T> ValueSetLayout<T> {
    pub fn new(dims: KernelDims, nnz: usize) -> Self {
        let mut layout = ArenaLayout::new();
        let a = layout.reserve(dims.m * dims.k);
        let b = layout.reserve(dims.n * dims.k);
        let c = layout.reserve(dims.m * dims.k);
        let values = layout.reserve(nnz);
        Self { layout, a, b, c, values }
    }
}

/// Layout of one index-typed replica.
#[derive(Debug, Clone)]
pub struct IndexSetLayout {
    pub layout: ArenaLayout<usize>,
    pub row_ptr: Region,
    pub col_index: Region,
}

impl IndexSetLayout {
    pub fn new(m: usize, nnz: usize) -> Self {
        let mut layout = ArenaLayout::new();
        let row_ptr = layout.reserve(m + 1);
        let col_index = layout.reserve(nnz);
        Self { layout, row_ptr, col_index }
    }
}

/// Replica counts, strides and the live cursors of one timed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaRotation {
    dataset_count: usize,
    dataset_stride: usize,
    index_set_count: usize,
    index_set_stride: usize,
    dataset_cursor: usize,
    index_cursor: usize,
}

impl ReplicaRotation {
    /// Counts are clamped to at least one.
    pub fn new(dataset_count: usize, dataset_stride: usize, index_set_count: usize, index_set_stride: usize) -> Self {
        let dataset_count = dataset_count.max(1);
        let index_set_count = index_set_count.max(1);
        Self {
            dataset_count,
            dataset_stride,
            index_set_count,
            index_set_stride,
            dataset_cursor: dataset_count,
            index_cursor: index_set_count,
        }
    }

    #[inline]
    pub fn dataset_count(&self) -> usize {
        self.dataset_count
    }

    #[inline]
    pub fn index_set_count(&self) -> usize {
        self.index_set_count
    }

    /// Step both cursors down and return the `(dataset, index set)` to use
    /// for this repetition. A cursor reaching zero wraps back to its count
    /// after being used.
    pub fn advance(&mut self) -> (usize, usize) {
        self.dataset_cursor -= 1;
        self.index_cursor -= 1;
        let picked = (self.dataset_cursor, self.index_cursor);
        if self.dataset_cursor == 0 {
            self.dataset_cursor = self.dataset_count;
        }
        if self.index_cursor == 0 {
            self.index_cursor = self.index_set_count;
        }
        picked
    }

    /// Element offsets of a `(dataset, index set)` pair from their arena bases.
    #[inline]
    pub fn offsets(&self, (d, i): (usize, usize)) -> (usize, usize) {
        (d * self.dataset_stride, i * self.index_set_stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replica_count_covers_cache() {
        assert_eq!(replica_count(1000, 300), 4);
        assert_eq!(replica_count(900, 300), 3);
        assert_eq!(replica_count(100, 300), 1);
        assert_eq!(replica_count(0, 300), 1);
        assert_eq!(replica_count(100, 0), 1);
        for (cache, fp) in [(25344 * 1024, 4096), (1 << 20, 777), (12345, 12344)] {
            let n = replica_count(cache, fp);
            assert!(n * fp >= cache);
            assert!((n - 1) * fp < cache || n == 1);
        }
    }

    #[test]
    fn test_cursor_visits_each_once_then_wraps() {
        let mut rot = ReplicaRotation::new(4, 100, 2, 10);
        let seq: Vec<(usize, usize)> = (0..8).map(|_| rot.advance()).collect();
        assert_eq!(
            seq,
            vec![(3, 1), (2, 0), (1, 1), (0, 0), (3, 1), (2, 0), (1, 1), (0, 0)]
        );
        assert_eq!(rot.offsets((3, 1)), (300, 10));
    }

    #[test]
    fn test_single_replica_repeats() {
        let mut rot = ReplicaRotation::new(0, 64, 1, 16);
        assert_eq!(rot.dataset_count(), 1);
        for _ in 0..5 {
            assert_eq!(rot.advance(), (0, 0));
        }
    }

    #[test]
    fn test_layout_footprints() {
        let dims = KernelDims { m: 3, n: 5, k: 4 };
        let v = ValueSetLayout::<f32>::new(dims, 7);
        // 12, 20, 12, 7 elements, each rounded to 16 f32
        assert_eq!(v.layout.stride(), 16 + 32 + 16 + 16);
        assert_eq!(v.c.offset, 48);
        let i = IndexSetLayout::new(3, 7);
        assert_eq!(i.row_ptr.len, 4);
        assert_eq!(i.layout.stride(), 8 + 8);
    }
}
