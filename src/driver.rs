//! Benchmark driver: load, check, time, report.
//!
//! One pass per invocation. The sparse matrix is loaded as CSC, sorted,
//! converted to CSR and sorted again; the requested row count is clamped to
//! the matrix. With checking enabled the correctness oracle runs first and a
//! failure aborts before any timing. Then the selected timer measures the
//! reference path and the fused path on identical inputs.
//!
//! A scalar-function override (`-udf`) changes only the fused path. The
//! trusted column then times the application's own reference kernel as a
//! baseline, and checking is refused.

use std::path::Path;

use fusedmm_reference::SigmoidTable;

use crate::cache_params::flush_bytes;
use crate::config::{BenchConfig, Precision};
use crate::error::{HarnessError, HarnessResult};
use crate::kernel_dispatcher::{ApplicationKernel, KernelDims, KernelPath};
use crate::oracle::{run_correctness_check, CheckReport};
use crate::profiling::report::BenchReport;
use crate::profiling::{PathRunner, TimingInputs};
use crate::sparse::{read_matrix_market, CsrMatrix};
use crate::validation::validate_kernel_dims;
use crate::Element;

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    pub report: BenchReport,
    pub check: Option<CheckReport>,
}

impl BenchOutcome {
    /// Lines printed to stdout, in order.
    pub fn render(&self, skip_header: bool) -> Vec<String> {
        let mut out = Vec::with_capacity(3);
        if self.check.is_some() {
            out.push("PASSED TEST".to_string());
        }
        if !skip_header {
            out.push(BenchReport::csv_header().to_string());
        }
        out.push(self.report.csv_line());
        out
    }
}

/// Configure the process-wide rayon pool. Call once, before any kernel.
pub fn configure_threads(threads: Option<usize>) -> HarnessResult<()> {
    let Some(n) = threads else {
        return Ok(());
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global()
        .map_err(|e| HarnessError::ThreadPool(e.to_string()))?;
    log::info!("rayon pool: {n} threads");
    Ok(())
}

/// Load a Matrix Market file as sorted CSR.
pub fn load_csr<T: Element>(path: &Path) -> HarnessResult<CsrMatrix<T>> {
    let csc = read_matrix_market::<T>(path)?;
    let mut csr = csc.to_csr()?;
    csr.sort_indices();
    Ok(csr)
}

/// Requested row count clamped to the matrix; `0` selects every row.
#[inline]
pub fn resolve_rows(requested: usize, rows: usize) -> usize {
    if requested == 0 || requested > rows {
        rows
    } else {
        requested
    }
}

/// Run one benchmark in the configured precision.
pub fn run(cfg: &BenchConfig) -> HarnessResult<BenchOutcome> {
    cfg.validate()?;
    match cfg.precision {
        Precision::Single => run_with::<f32>(cfg),
        Precision::Double => run_with::<f64>(cfg),
    }
}

fn run_with<T: Element>(cfg: &BenchConfig) -> HarnessResult<BenchOutcome> {
    let csr = load_csr::<T>(&cfg.input)?;
    run_on_matrix(cfg, &csr, &cfg.input.display().to_string())
}

/// Run against an already loaded matrix. `filename` only labels the report.
pub fn run_on_matrix<T: Element>(cfg: &BenchConfig, csr: &CsrMatrix<T>, filename: &str) -> HarnessResult<BenchOutcome> {
    let m = resolve_rows(cfg.m, csr.rows());
    let dims = KernelDims { m, n: csr.cols(), k: cfg.k };
    validate_kernel_dims(dims.m, dims.n, dims.k).map_err(HarnessError::InvalidDimensions)?;
    log::info!(
        "{filename}: {}x{} nnz={} M={m} K={} app={} precision={} timer={}",
        csr.rows(),
        csr.cols(),
        csr.nnz(),
        dims.k,
        cfg.app,
        T::NAME,
        cfg.timer.name()
    );

    let table = SigmoidTable::<T>::new();
    let reference = ApplicationKernel::new(cfg.app, cfg.force_order, &table);
    let fused = ApplicationKernel::with_udf(cfg.app, cfg.force_order, &table, cfg.scalar_function())?;
    let alpha = T::from_f64(cfg.alpha);
    let beta = T::from_f64(cfg.beta);

    let check = if cfg.run_check {
        if !fused.has_reference() {
            return Err(HarnessError::InvalidConfig(format!(
                "no trusted kernel to check {} against with scalar function {}",
                cfg.app,
                cfg.scalar_function().tag()
            )));
        }
        let report = run_correctness_check(&fused, csr, dims, alpha, beta, &cfg.error_policy, cfg.seed)?;
        if !report.passed() {
            return Err(HarnessError::CorrectnessMismatch { count: report.mismatches });
        }
        log::info!("correctness check passed, tolerance {:e}", report.tolerance);
        Some(report)
    } else {
        None
    };

    let inputs = TimingInputs {
        csr,
        dims,
        alpha,
        beta,
        nrep: cfg.nrep,
        cache_bytes: flush_bytes(cfg.cache_kb),
        seed: cfg.seed,
    };
    let trusted = cfg.timer.time(&mut PathRunner::new(&reference, KernelPath::Trusted), &inputs)?;
    let test = cfg.timer.time(&mut PathRunner::new(&fused, KernelPath::Fused), &inputs)?;

    let report = BenchReport {
        filename: filename.to_string(),
        nnz: csr.nnz(),
        m,
        n: dims.n,
        k: dims.k,
        trusted,
        test,
    };
    log::info!("speedup {:.3}x", report.speedup());
    Ok(BenchOutcome { report, check })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_types::ApplicationKind;
    use crate::oracle::ErrorBoundPolicy;
    use crate::profiling::TimerKind;
    use crate::udf::ScalarFunctionKind;

    #[test]
    fn test_resolve_rows() {
        assert_eq!(resolve_rows(0, 10), 10);
        assert_eq!(resolve_rows(11, 10), 10);
        assert_eq!(resolve_rows(4, 10), 4);
    }

    #[test]
    fn test_run_on_matrix_with_check() {
        let csr = CsrMatrix::<f64>::from_pattern(3, 3, vec![0, 2, 3, 4], vec![1, 2, 0, 0]).unwrap();
        for app in ApplicationKind::ALL {
            let cfg = BenchConfig {
                k: 4,
                nrep: 2,
                cache_kb: 4,
                run_check: true,
                app,
                timer: TimerKind::Steady,
                ..BenchConfig::with_input("mem")
            };
            let out = run_on_matrix(&cfg, &csr, "mem").unwrap();
            assert!(out.check.as_ref().unwrap().passed(), "{app}");
            assert_eq!((out.report.m, out.report.n, out.report.nnz), (3, 3, 4));
            let lines = out.render(true);
            assert_eq!(lines[0], "PASSED TEST");
            assert!(lines[1].starts_with("mem,4,3,3,4,"));
        }
    }

    #[test]
    fn test_failed_check_aborts_before_timing() {
        // a negative bound fails every element, however close the paths agree
        let csr = CsrMatrix::<f64>::from_pattern(3, 3, vec![0, 2, 3, 4], vec![1, 2, 0, 0]).unwrap();
        let cfg = BenchConfig {
            k: 4,
            nrep: 2,
            cache_kb: 4,
            run_check: true,
            app: ApplicationKind::Sigmoid,
            timer: TimerKind::Steady,
            error_policy: ErrorBoundPolicy::default().with_safety_factor(-1.0),
            ..BenchConfig::with_input("mem")
        };
        match run_on_matrix(&cfg, &csr, "mem") {
            Err(HarnessError::CorrectnessMismatch { count }) => assert_eq!(count, 3 * 4),
            other => panic!("expected a correctness mismatch, got {other:?}"),
        }
        let fewer_rows = BenchConfig { m: 2, ..cfg };
        assert!(matches!(
            run_on_matrix(&fewer_rows, &csr, "mem"),
            Err(HarnessError::CorrectnessMismatch { count: 8 })
        ));
    }

    #[test]
    fn test_udf_override_times_fused_path() {
        let csr = CsrMatrix::<f64>::from_pattern(3, 3, vec![0, 2, 3, 4], vec![1, 2, 0, 0]).unwrap();
        let cfg = BenchConfig {
            k: 4,
            nrep: 2,
            cache_kb: 4,
            app: ApplicationKind::TDistribution,
            udf: Some(ScalarFunctionKind::LogLikelihood),
            timer: TimerKind::Steady,
            ..BenchConfig::with_input("mem")
        };
        let out = run_on_matrix(&cfg, &csr, "mem").unwrap();
        assert!(out.check.is_none());
        assert!(out.report.test.exec_secs.is_finite() && out.report.trusted.exec_secs.is_finite());

        let checked = BenchConfig { run_check: true, ..cfg.clone() };
        assert!(matches!(run_on_matrix(&checked, &csr, "mem"), Err(HarnessError::InvalidConfig(_))));
        let no_stage = BenchConfig { app: ApplicationKind::WeightedAggregation, ..cfg };
        assert!(matches!(run_on_matrix(&no_stage, &csr, "mem"), Err(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let cfg = BenchConfig::with_input("/nonexistent/graph.mtx");
        assert!(matches!(run(&cfg), Err(HarnessError::Io { .. })));
    }
}
