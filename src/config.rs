//! Benchmark run configuration.

use std::path::PathBuf;

use fusedmm_reference::SubtractOrder;

use crate::error::{HarnessError, HarnessResult};
use crate::kernel_types::ApplicationKind;
use crate::oracle::ErrorBoundPolicy;
use crate::profiling::TimerKind;
use crate::udf::ScalarFunctionKind;

/// Floating-point precision of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Single,
    Double,
}

impl Precision {
    pub fn from_tag(tag: &str) -> HarnessResult<Self> {
        match tag {
            "s" | "f32" | "single" => Ok(Precision::Single),
            "d" | "f64" | "double" => Ok(Precision::Double),
            other => Err(HarnessError::InvalidConfig(format!("unknown precision {other:?}"))),
        }
    }
}

/// One benchmark invocation.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Matrix Market file with the sparse adjacency.
    pub input: PathBuf,
    /// Rows to process; `0` or more than the matrix has means all of them.
    pub m: usize,
    /// Feature dimension.
    pub k: usize,
    /// Cache to defeat, in KiB; `0` means the detected last-level cache.
    pub cache_kb: usize,
    pub nrep: usize,
    /// Run the correctness oracle before timing.
    pub run_check: bool,
    pub app: ApplicationKind,
    /// Scalar function for the fused path; `None` keeps the application's own.
    pub udf: Option<ScalarFunctionKind>,
    pub skip_header: bool,
    pub alpha: f64,
    pub beta: f64,
    /// Rayon worker count; `None` keeps rayon's default.
    pub threads: Option<usize>,
    pub precision: Precision,
    pub timer: TimerKind,
    pub seed: u64,
    /// Operand order of the force-repulsion difference.
    pub force_order: SubtractOrder,
    pub error_policy: ErrorBoundPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            m: 0,
            k: 128,
            cache_kb: 25344,
            nrep: 20,
            run_check: false,
            app: ApplicationKind::Sigmoid,
            udf: None,
            skip_header: false,
            alpha: 1.0,
            beta: 0.0,
            threads: None,
            precision: Precision::Single,
            timer: TimerKind::CacheFlushing,
            seed: 0,
            force_order: SubtractOrder::LhsMinusRhs,
            error_policy: ErrorBoundPolicy::default(),
        }
    }
}

impl BenchConfig {
    pub fn with_input(input: impl Into<PathBuf>) -> Self {
        Self { input: input.into(), ..Self::default() }
    }

    /// Reject configurations no run can satisfy.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.input.as_os_str().is_empty() {
            return Err(HarnessError::MissingInput);
        }
        if self.k == 0 {
            return Err(HarnessError::InvalidConfig("K must be at least 1".into()));
        }
        if self.nrep == 0 {
            return Err(HarnessError::InvalidConfig("nrep must be at least 1".into()));
        }
        if self.threads == Some(0) {
            return Err(HarnessError::InvalidConfig("thread count must be at least 1".into()));
        }
        if self.run_check && self.overrides_udf() {
            return Err(HarnessError::InvalidConfig(format!(
                "no trusted kernel to check {} against with scalar function {}",
                self.app,
                self.scalar_function().tag()
            )));
        }
        Ok(())
    }

    /// Scalar function the fused path runs.
    pub fn scalar_function(&self) -> ScalarFunctionKind {
        self.udf.unwrap_or_else(|| ScalarFunctionKind::for_application(self.app))
    }

    /// Whether the fused path departs from the application's reference kernel.
    pub fn overrides_udf(&self) -> bool {
        self.scalar_function() != ScalarFunctionKind::for_application(self.app)
    }
}
