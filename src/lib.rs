//! fusedmm-kernels: fused sparse-dense graph kernels with a correctness
//! oracle and a cache-flushing benchmark harness.
//!
//! A single fused kernel computes, for every row `i` of a CSR adjacency,
//! `Z[i] = Σ_j f(X[i], Y[j], w_ij)` where `f` is assembled from five stages
//! (vector op, reduction, scalar op, vector scale, accumulate) selected by an
//! [`OpMessage`]. Five graph-embedding and aggregation workloads are
//! expressed as such messages; each also has a straightforward per-row
//! reference implementation in the `fusedmm-reference` crate.
//!
//! - **Oracle**: [`oracle::run_correctness_check`] runs both paths on the same
//!   random inputs and compares them under a per-application error bound.
//! - **Timers**: [`profiling::TimerKind`] measures either cache-resident or
//!   cold-cache per-call time.
//! - **Driver**: [`driver::run`] loads a Matrix Market file and produces the
//!   CSV [`profiling::report::BenchReport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use fusedmm_kernels::{driver, BenchConfig};
//!
//! let cfg = BenchConfig { run_check: true, ..BenchConfig::with_input("graph.mtx") };
//! let outcome = driver::run(&cfg)?;
//! println!("{}", outcome.report);
//! ```

pub mod cache_params;
pub mod cli;
pub mod config;
pub mod dense;
pub mod driver;
pub mod error;
pub mod kernel_dispatcher;
pub mod kernel_types;
pub mod oracle;
pub mod profiling;
pub mod sparse;
pub mod trusted;
pub mod udf;
pub mod validation;
pub mod workspace;

pub use fusedmm_reference::{CsrView, DenseMut, DenseRef, Real, SigmoidTable, SubtractOrder};

pub use config::{BenchConfig, Precision};
pub use driver::BenchOutcome;
pub use error::{HarnessError, HarnessResult};
pub use kernel_dispatcher::{fused_mm_csr, ApplicationKernel, KernelCall, KernelDims, KernelPath};
pub use kernel_types::{
    AccumulateOp, ApplicationKind, OpMessage, ReduceOp, ScalarOp, VectorOp, VectorScaleOp,
};
pub use oracle::{CheckReport, ErrorBoundPolicy, FlopModel};
pub use profiling::{KernelRunner, TimerKind, Timing};
pub use sparse::{CscMatrix, CsrMatrix};
pub use udf::{ScalarFunction, ScalarFunctionKind, ScalarUdf};

/// Element type of every harness buffer: a [`Real`] that may live in a
/// zero-initialised [`workspace::Arena`].
pub trait Element: Real + bytemuck::Pod {}

impl<T: Real + bytemuck::Pod> Element for T {}
