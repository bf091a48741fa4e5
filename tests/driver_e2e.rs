//! End-to-end driver runs on temporary Matrix Market files.

use std::io::Write;

use tempfile::NamedTempFile;

use fusedmm_kernels::cli::Cli;
use fusedmm_kernels::driver::{self, load_csr};
use fusedmm_kernels::profiling::report::CSV_HEADER;
use fusedmm_kernels::{ApplicationKind, BenchConfig, HarnessError, Precision, TimerKind};

/// 6-node ring with one chord, stored as a symmetric pattern.
const RING_MTX: &str = "\
%%MatrixMarket matrix coordinate pattern symmetric
% ring 0-1-2-3-4-5-0 plus chord 0-3
6 6 7
2 1
3 2
4 3
5 4
6 5
6 1
4 1
";

fn mtx_file(body: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".mtx").tempfile().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

fn quick(path: &std::path::Path) -> BenchConfig {
    BenchConfig {
        k: 8,
        nrep: 3,
        cache_kb: 64,
        run_check: true,
        ..BenchConfig::with_input(path)
    }
}

#[test]
fn test_loader_mirrors_symmetric_entries() {
    let f = mtx_file(RING_MTX);
    let csr = load_csr::<f32>(f.path()).unwrap();
    assert_eq!((csr.rows(), csr.cols(), csr.nnz()), (6, 6, 14));
    assert!(csr.has_sorted_indices());
    assert_eq!(&csr.col_index()[csr.row_ptr()[0]..csr.row_ptr()[1]], &[1, 3, 5]);
    assert_eq!(csr.max_row_degree(6), 3);
}

#[test]
fn test_every_application_checks_and_times() {
    let f = mtx_file(RING_MTX);
    for app in ApplicationKind::ALL {
        for timer in [TimerKind::CacheFlushing, TimerKind::Steady] {
            let cfg = BenchConfig { app, timer, ..quick(f.path()) };
            let out = driver::run(&cfg).unwrap();
            assert!(out.check.as_ref().is_some_and(|c| c.passed()), "{app} {}", timer.name());
            let r = &out.report;
            assert_eq!((r.nnz, r.m, r.n, r.k), (14, 6, 6, 8));
            assert!(r.trusted.exec_secs >= 0.0 && r.test.exec_secs >= 0.0);
        }
    }
}

#[test]
fn test_double_precision_and_row_subset() {
    let f = mtx_file(RING_MTX);
    let cfg = BenchConfig {
        m: 4,
        precision: Precision::Double,
        app: ApplicationKind::TDistribution,
        ..quick(f.path())
    };
    let out = driver::run(&cfg).unwrap();
    assert_eq!(out.report.m, 4);
    assert_eq!(out.check.unwrap().checked, 4 * 8);
}

#[test]
fn test_rendered_output() {
    let f = mtx_file(RING_MTX);
    let out = driver::run(&BenchConfig { run_check: false, ..quick(f.path()) }).unwrap();

    let with_header = out.render(false);
    assert_eq!(with_header.len(), 2);
    assert_eq!(with_header[0], CSV_HEADER);

    let lines = out.render(true);
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], f.path().display().to_string());
    assert_eq!(&fields[1..5], &["14", "6", "6", "8"]);
    let trusted: f64 = fields[5].parse().unwrap();
    let test: f64 = fields[6].parse().unwrap();
    assert!(trusted >= 0.0 && test >= 0.0);
}

#[test]
fn test_cli_to_driver() {
    let f = mtx_file(RING_MTX);
    let path = f.path().to_str().unwrap().to_string();
    let cli = Cli::parse_normalized([
        "fusedmm-time", "-input", path.as_str(), "-K", "4", "-nrep", "2", "-C", "16", "-T", "1", "-t", "m", "-skHd", "1",
    ])
    .unwrap();
    let cfg = cli.into_config().unwrap();
    assert!(cfg.skip_header);
    let out = driver::run(&cfg).unwrap();
    let lines = out.render(cfg.skip_header);
    assert_eq!(lines[0], "PASSED TEST");
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_malformed_file_names_line() {
    let f = mtx_file("%%MatrixMarket matrix coordinate real general\n3 3 2\n1 1 0.5\n9 1 1.0\n");
    let err = driver::run(&quick(f.path())).unwrap_err();
    match err {
        HarnessError::Parse { line, .. } => assert_eq!(line, 4),
        other => panic!("expected parse error, got {other:?}"),
    }
}
