//! Sigmoid lookup table and the clamped t-distribution scale.

use crate::real::Real;

/// Number of table entries.
pub const SM_TABLE_SIZE: usize = 2048;
/// Half-width of the tabulated input range `[-SM_BOUND, SM_BOUND]`.
pub const SM_BOUND: f64 = 5.0;
/// Entries per unit of input.
pub const SM_RESOLUTION: f64 = SM_TABLE_SIZE as f64 / (2.0 * SM_BOUND);
/// Magnitude limit applied by [`tdist_scale`].
pub const TDIST_CLAMP: f64 = 5.0;

/// Tabulated logistic function `1 / (1 + e^-x)` over `[-5, 5)`.
///
/// Built once per run and shared by reference between the reference
/// sigmoid kernel and the fused sigmoid-complement scalar function, so both
/// read the exact same entries.
#[derive(Debug, Clone)]
pub struct SigmoidTable<T> {
    entries: Vec<T>,
}

impl<T: Real> SigmoidTable<T> {
    pub fn new() -> Self {
        let entries = (0..SM_TABLE_SIZE)
            .map(|i| {
                let x = 2.0 * SM_BOUND * i as f64 / SM_TABLE_SIZE as f64 - SM_BOUND;
                T::from_f64(1.0 / (1.0 + (-x).exp()))
            })
            .collect();
        Self { entries }
    }

    /// Approximate logistic of `v`; saturates to exactly 0 or 1 outside the table.
    #[inline(always)]
    pub fn lookup(&self, v: T) -> T {
        let x = v.to_f64();
        if x >= SM_BOUND {
            T::one()
        } else if x <= -SM_BOUND {
            T::zero()
        } else {
            let idx = ((x + SM_BOUND) * SM_RESOLUTION) as usize;
            self.entries[idx.min(SM_TABLE_SIZE - 1)]
        }
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

impl<T: Real> Default for SigmoidTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a raw t-distribution scale into `[-TDIST_CLAMP, TDIST_CLAMP]`.
#[inline(always)]
pub fn tdist_scale<T: Real>(v: T) -> T {
    let bound = T::from_f64(TDIST_CLAMP);
    if v > bound {
        bound
    } else if v < -bound {
        -bound
    } else {
        v
    }
}
