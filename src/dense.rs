//! Dense operand helpers: reproducible random initialisation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Real;

/// Deterministic generator for one run.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Fill `dst` with uniform samples from `[0, 1)`, drawn in `f64` and
/// rounded to `T`.
pub fn fill_uniform<T: Real, R: Rng + ?Sized>(rng: &mut R, dst: &mut [T]) {
    for x in dst.iter_mut() {
        *x = T::from_f64(rng.gen::<f64>());
    }
}

/// `rows x ld` row-major buffer of uniform samples.
pub fn random_matrix<T: Real, R: Rng + ?Sized>(rng: &mut R, rows: usize, ld: usize) -> Vec<T> {
    let mut v = vec![T::zero(); rows * ld];
    fill_uniform(rng, &mut v);
    v
}
