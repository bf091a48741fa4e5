//! Cache-line aligned dense workspace.
//!
//! A run declares its buffers once in an [`ArenaLayout`], then materialises
//! one or more physically distinct replicas of that layout in a single
//! 64-byte aligned allocation. Every region starts on a cache-line boundary,
//! so each replica's footprint is a whole number of lines.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::error::{HarnessError, HarnessResult};

/// Cache line size assumed for alignment and padding.
pub const CACHE_LINE: usize = 64;

/// Elements of `T` per cache line (at least one).
#[inline]
pub const fn line_elems<T>() -> usize {
    let s = std::mem::size_of::<T>();
    if s == 0 || s >= CACHE_LINE {
        1
    } else {
        CACHE_LINE / s
    }
}

/// Round an element count up to a whole number of cache lines.
#[inline]
pub fn round_up_to_line<T>(n: usize) -> usize {
    let le = line_elems::<T>();
    n.div_ceil(le) * le
}

// ── Aligned storage ──────────────────────────────────────────────────

/// One zeroed, 64-byte aligned cache line of raw storage.
#[repr(C, align(64))]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CacheLine([u8; CACHE_LINE]);

/// Zero-initialised, 64-byte aligned, fixed-length buffer of `T`.
///
/// Storage is a `Vec` of whole cache lines, viewed as `T` through
/// `bytemuck`, so `T` must tile a line exactly.
pub struct AlignedBuf<T: Pod> {
    lines: Vec<CacheLine>,
    len: usize,
    _elem: PhantomData<T>,
}

impl<T: Pod> AlignedBuf<T> {
    pub fn zeroed(len: usize) -> HarnessResult<Self> {
        let size = std::mem::size_of::<T>();
        if size == 0 || CACHE_LINE % size != 0 {
            return Err(HarnessError::InvalidConfig(format!(
                "element size {size} does not tile a {CACHE_LINE}-byte cache line"
            )));
        }
        let bytes = len
            .checked_mul(size)
            .ok_or(HarnessError::AllocationFailure { bytes: usize::MAX })?;
        let nlines = bytes.div_ceil(CACHE_LINE);
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(nlines)
            .map_err(|_| HarnessError::AllocationFailure { bytes: nlines * CACHE_LINE })?;
        lines.resize(nlines, CacheLine([0; CACHE_LINE]));
        Ok(Self { lines, len, _elem: PhantomData })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &bytemuck::cast_slice::<CacheLine, T>(&self.lines)[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut bytemuck::cast_slice_mut::<CacheLine, T>(&mut self.lines)[..self.len]
    }
}

// ── Layout and regions ───────────────────────────────────────────────

/// Handle to a sub-allocation: element offset and length within one replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Ordered list of cache-line aligned regions making up one replica.
#[derive(Debug, Clone)]
pub struct ArenaLayout<T> {
    stride: usize,
    regions: Vec<Region>,
    _elem: PhantomData<T>,
}

impl<T> ArenaLayout<T> {
    pub fn new() -> Self {
        Self { stride: 0, regions: Vec::new(), _elem: PhantomData }
    }

    /// Reserve `len` elements starting on the next cache line.
    pub fn reserve(&mut self, len: usize) -> Region {
        let region = Region { offset: self.stride, len };
        self.stride += round_up_to_line::<T>(len);
        self.regions.push(region);
        region
    }

    /// Elements per replica.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn stride_bytes(&self) -> usize {
        self.stride * std::mem::size_of::<T>()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl<T> Default for ArenaLayout<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Arena ────────────────────────────────────────────────────────────

/// `replicas` back-to-back copies of one layout in a single allocation.
pub struct Arena<T: Pod> {
    buf: AlignedBuf<T>,
    stride: usize,
    replicas: usize,
}

impl<T: Pod> Arena<T> {
    pub fn new(layout: &ArenaLayout<T>, replicas: usize) -> HarnessResult<Self> {
        let stride = layout.stride();
        let total = stride
            .checked_mul(replicas)
            .ok_or(HarnessError::AllocationFailure { bytes: usize::MAX })?;
        let buf = AlignedBuf::zeroed(total)?;
        log::debug!(
            "arena: {} replicas x {} elems ({} bytes each)",
            replicas,
            stride,
            layout.stride_bytes()
        );
        Ok(Self { buf, stride, replicas })
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// Element offset of replica `r` from the arena base.
    #[inline]
    pub fn replica_offset(&self, r: usize) -> usize {
        r * self.stride
    }

    pub fn replica(&self, r: usize) -> &[T] {
        self.replica_at(self.replica_offset(r))
    }

    pub fn replica_mut(&mut self, r: usize) -> &mut [T] {
        self.replica_at_mut(self.replica_offset(r))
    }

    /// Replica starting `base` elements from the arena base.
    /// `base` must be a multiple of the stride.
    pub fn replica_at(&self, base: usize) -> &[T] {
        debug_assert_eq!(base % self.stride.max(1), 0, "offset {base} is not a replica boundary");
        &self.buf.as_slice()[base..base + self.stride]
    }

    pub fn replica_at_mut(&mut self, base: usize) -> &mut [T] {
        debug_assert_eq!(base % self.stride.max(1), 0, "offset {base} is not a replica boundary");
        let stride = self.stride;
        &mut self.buf.as_mut_slice()[base..base + stride]
    }

    #[inline]
    pub fn region(&self, r: usize, region: Region) -> &[T] {
        self.region_at(self.replica_offset(r), region)
    }

    /// `region` of the replica at element offset `base`.
    #[inline]
    pub fn region_at(&self, base: usize, region: Region) -> &[T] {
        &self.replica_at(base)[region.offset..region.end()]
    }

    #[inline]
    pub fn region_mut(&mut self, r: usize, region: Region) -> &mut [T] {
        &mut self.replica_mut(r)[region.offset..region.end()]
    }

    /// Borrow `out` mutably and the rest of replica `r` shared, at once.
    pub fn split_output(&mut self, r: usize, out: Region) -> (Carved<'_, T>, &mut [T]) {
        self.split_output_at(self.replica_offset(r), out)
    }

    /// [`Arena::split_output`] for the replica at element offset `base`.
    pub fn split_output_at(&mut self, base: usize, out: Region) -> (Carved<'_, T>, &mut [T]) {
        let replica = self.replica_at_mut(base);
        let (before, rest) = replica.split_at_mut(out.offset);
        let (output, after) = rest.split_at_mut(out.len);
        let carved = Carved { before, after, after_base: out.end() };
        (carved, output)
    }
}

/// Read-only remainder of a replica after its output region was split off.
pub struct Carved<'a, T> {
    before: &'a [T],
    after: &'a [T],
    after_base: usize,
}

impl<'a, T> Carved<'a, T> {
    /// Slice for `region`, which must not overlap the split-off output.
    pub fn get(&self, region: Region) -> &'a [T] {
        let (before, after): (&'a [T], &'a [T]) = (self.before, self.after);
        if region.end() <= before.len() {
            &before[region.offset..region.end()]
        } else {
            debug_assert!(region.offset >= self.after_base, "region overlaps the output");
            let lo = region.offset - self.after_base;
            &after[lo..lo + region.len]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rounding() {
        assert_eq!(line_elems::<f32>(), 16);
        assert_eq!(line_elems::<f64>(), 8);
        assert_eq!(round_up_to_line::<f32>(0), 0);
        assert_eq!(round_up_to_line::<f32>(1), 16);
        assert_eq!(round_up_to_line::<f32>(16), 16);
        assert_eq!(round_up_to_line::<f64>(17), 24);
    }

    #[test]
    fn test_aligned_buf() {
        let mut v = AlignedBuf::<f32>::zeroed(1000).unwrap();
        assert_eq!(v.len(), 1000);
        assert_eq!(v.as_slice().as_ptr() as usize % CACHE_LINE, 0, "not 64-byte aligned");
        assert!(v.as_slice().iter().all(|&x| x == 0.0));
        for (i, x) in v.as_mut_slice().iter_mut().enumerate() {
            *x = i as f32;
        }
        assert_eq!(v.as_slice()[999], 999.0);
        let empty = AlignedBuf::<f64>::zeroed(0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_aligned_buf_partial_line() {
        // 5 f64 occupy part of one line; the view stops at len.
        let v = AlignedBuf::<f64>::zeroed(5).unwrap();
        assert_eq!(v.as_slice().len(), 5);
        assert_eq!(v.as_slice().as_ptr() as usize % CACHE_LINE, 0);
        let w = AlignedBuf::<usize>::zeroed(3).unwrap();
        assert_eq!(w.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn test_element_must_tile_line() {
        assert!(matches!(AlignedBuf::<[u8; 3]>::zeroed(4), Err(HarnessError::InvalidConfig(_))));
        let mut layout = ArenaLayout::<[u8; 3]>::new();
        layout.reserve(2);
        assert!(Arena::new(&layout, 1).is_err());
    }

    #[test]
    fn test_offset_addressing_matches_index() {
        let mut layout = ArenaLayout::<f32>::new();
        let a = layout.reserve(3);
        let c = layout.reserve(3);
        let mut arena = Arena::new(&layout, 3).unwrap();
        let base = arena.replica_offset(2);
        assert_eq!(base, 2 * layout.stride());
        arena.replica_at_mut(base)[a.offset..a.end()].fill(4.0);
        let (inputs, out) = arena.split_output_at(base, c);
        out.copy_from_slice(inputs.get(a));
        assert_eq!(arena.region(2, c), &[4.0; 3]);
        assert_eq!(arena.replica_at(base).as_ptr(), arena.replica(2).as_ptr());
        assert_eq!(arena.region_at(base, c), arena.region(2, c));
        assert_eq!(arena.region(1, c), &[0.0; 3]);
    }

    #[test]
    fn test_regions_are_line_aligned() {
        let mut layout = ArenaLayout::<f64>::new();
        let a = layout.reserve(10);
        let b = layout.reserve(3);
        assert_eq!(a, Region { offset: 0, len: 10 });
        assert_eq!(b, Region { offset: 16, len: 3 });
        assert_eq!(layout.stride(), 16 + 8);
        assert_eq!(layout.stride_bytes() % CACHE_LINE, 0);

        let arena = Arena::new(&layout, 3).unwrap();
        for r in 0..3 {
            for reg in layout.regions() {
                let s = arena.region(r, *reg);
                assert_eq!(s.as_ptr() as usize % CACHE_LINE, 0, "replica {r} region {reg:?}");
                assert_eq!(s.len(), reg.len);
            }
        }
    }

    #[test]
    fn test_replicas_are_distinct() {
        let mut layout = ArenaLayout::<u32>::new();
        let a = layout.reserve(4);
        let mut arena = Arena::new(&layout, 2).unwrap();
        arena.region_mut(0, a).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(arena.region(1, a), &[0, 0, 0, 0]);
        assert_eq!(arena.replica_offset(1), arena.stride());
    }

    #[test]
    fn test_split_output() {
        let mut layout = ArenaLayout::<f32>::new();
        let a = layout.reserve(4);
        let c = layout.reserve(4);
        let b = layout.reserve(4);
        let mut arena = Arena::new(&layout, 2).unwrap();
        arena.region_mut(1, a).fill(1.0);
        arena.region_mut(1, b).fill(2.0);
        let (inputs, out) = arena.split_output(1, c);
        for (o, (x, y)) in out.iter_mut().zip(inputs.get(a).iter().zip(inputs.get(b))) {
            *o = x + y;
        }
        assert_eq!(arena.region(1, c), &[3.0; 4]);
        assert_eq!(arena.region(0, c), &[0.0; 4]);
    }
}
