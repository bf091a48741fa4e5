//! Unfused reference kernels for graph-embedding updates.
//!
//! Each application has one direct implementation here that computes the
//! per-edge quantity and folds it into the output row in the most literal
//! way possible. These kernels are the golden reference the fused
//! dispatcher is checked against, so they are intentionally kept free of
//! any stage composition or operand reuse.
//!
//! Every kernel is row-parallel: output rows are split across the rayon
//! pool and each task owns one row plus a private temporary of length `k`.

pub mod aggregate;
pub mod embedding;
pub mod real;
pub mod sigmoid;
pub mod view;

pub use aggregate::{gcn_csr, spmm_csr};
pub use embedding::{force_repulsion_csr, sigmoid_csr, tdist_csr, SubtractOrder};
pub use real::Real;
pub use sigmoid::{tdist_scale, SigmoidTable, SM_BOUND, SM_RESOLUTION, SM_TABLE_SIZE, TDIST_CLAMP};
pub use view::{CsrView, DenseMut, DenseRef};
