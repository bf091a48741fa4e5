//! Fused path vs reference path over random graphs.
//!
//! - every application passes the oracle in both precisions
//! - the two paths agree bitwise (same operation order)
//! - NaN in the fused output always fails
//! - force-repulsion direction flips the sign of the result

use proptest::prelude::*;

use fusedmm_kernels::dense::{random_matrix, seeded_rng};
use fusedmm_kernels::oracle::{compare_outputs, run_correctness_check};
use fusedmm_kernels::{
    ApplicationKernel, ApplicationKind, CsrMatrix, DenseMut, DenseRef, ErrorBoundPolicy, KernelCall, KernelDims,
    KernelPath, SigmoidTable, SubtractOrder,
};

/// Random CSR with `rows` rows, `cols` columns and up to `max_deg` distinct
/// neighbours per row.
fn arb_graph(max_rows: usize, max_deg: usize) -> impl Strategy<Value = (usize, usize, Vec<usize>, Vec<usize>)> {
    (1..=max_rows, 1..=max_rows).prop_flat_map(move |(rows, cols)| {
        let row = proptest::collection::btree_set(0..cols, 0..=max_deg.min(cols));
        proptest::collection::vec(row, rows).prop_map(move |sets| {
            let mut row_ptr = Vec::with_capacity(rows + 1);
            let mut col_index = Vec::new();
            row_ptr.push(0);
            for set in sets {
                col_index.extend(set);
                row_ptr.push(col_index.len());
            }
            (rows, cols, row_ptr, col_index)
        })
    })
}

fn app_strategy() -> impl Strategy<Value = ApplicationKind> {
    prop::sample::select(ApplicationKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_application_passes_f32(
        (rows, cols, row_ptr, col_index) in arb_graph(24, 8),
        app in app_strategy(),
        k in 1usize..20,
        seed in any::<u64>(),
    ) {
        let csr = CsrMatrix::<f32>::from_pattern(rows, cols, row_ptr, col_index).unwrap();
        let table = SigmoidTable::new();
        let kernel = ApplicationKernel::new(app, SubtractOrder::default(), &table);
        let dims = KernelDims { m: rows, n: cols, k };
        let report = run_correctness_check(&kernel, &csr, dims, 1.0, 0.0, &ErrorBoundPolicy::default(), seed).unwrap();
        prop_assert!(report.passed(), "{app}: {report:?}");
        prop_assert_eq!(report.checked, rows * k);
    }

    #[test]
    fn prop_every_application_passes_f64(
        (rows, cols, row_ptr, col_index) in arb_graph(16, 6),
        app in app_strategy(),
        k in 1usize..12,
        m_frac in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let csr = CsrMatrix::<f64>::from_pattern(rows, cols, row_ptr, col_index).unwrap();
        let table = SigmoidTable::new();
        let kernel = ApplicationKernel::new(app, SubtractOrder::RhsMinusLhs, &table);
        let m = ((rows as f64 * m_frac) as usize).max(1);
        let dims = KernelDims { m, n: cols, k };
        let report = run_correctness_check(&kernel, &csr, dims, 1.0, 0.0, &ErrorBoundPolicy::default(), seed).unwrap();
        prop_assert!(report.passed(), "{app}: {report:?}");
    }

    #[test]
    fn prop_paths_agree_bitwise(
        (rows, cols, row_ptr, col_index) in arb_graph(12, 5),
        app in app_strategy(),
        k in 1usize..10,
        seed in any::<u64>(),
    ) {
        let csr = CsrMatrix::<f32>::from_pattern(rows, cols, row_ptr, col_index).unwrap();
        let table = SigmoidTable::new();
        let kernel = ApplicationKernel::new(app, SubtractOrder::default(), &table);
        let mut rng = seeded_rng(seed);
        let a = random_matrix::<f32, _>(&mut rng, rows, k);
        let b = random_matrix::<f32, _>(&mut rng, cols, k);
        let call = KernelCall {
            dims: KernelDims { m: rows, n: cols, k },
            alpha: 1.0,
            beta: 0.0,
            s: csr.view(rows),
            a: DenseRef::new(&a, k),
            b: DenseRef::new(&b, k),
        };
        let mut trusted = vec![0.0f32; rows * k];
        let mut fused = vec![0.0f32; rows * k];
        kernel.run(KernelPath::Trusted, &call, DenseMut::new(&mut trusted, k)).unwrap();
        kernel.run(KernelPath::Fused, &call, DenseMut::new(&mut fused, k)).unwrap();
        for (t, f) in trusted.iter().zip(&fused) {
            prop_assert_eq!(t.to_bits(), f.to_bits());
        }
    }
}

#[test]
fn test_nan_always_fails() {
    let expected = [1.0f32, 2.0, 3.0, 4.0];
    let actual = [1.0f32, f32::NAN, 3.0, 4.0];
    let report = compare_outputs(&expected, &actual, 2, 2, 2, f64::INFINITY);
    assert_eq!(report.mismatches, 1);
    let first = report.first.unwrap();
    assert_eq!((first.row, first.col), (0, 1));
}

#[test]
fn test_force_direction_flips_sign() {
    let csr = CsrMatrix::<f64>::from_pattern(2, 2, vec![0, 1, 2], vec![1, 0]).unwrap();
    let table = SigmoidTable::new();
    let a = [0.0, 0.0, 1.0, 2.0];
    let b = [3.0, 1.0, 0.5, 0.5];
    let call = KernelCall {
        dims: KernelDims { m: 2, n: 2, k: 2 },
        alpha: 1.0,
        beta: 0.0,
        s: csr.view(2),
        a: DenseRef::new(&a, 2),
        b: DenseRef::new(&b, 2),
    };
    let run = |order| {
        let kernel = ApplicationKernel::new(ApplicationKind::ForceRepulsion, order, &table);
        let mut c = vec![0.0f64; 4];
        kernel.run(KernelPath::Fused, &call, DenseMut::new(&mut c, 2)).unwrap();
        c
    };
    let forward = run(SubtractOrder::LhsMinusRhs);
    let backward = run(SubtractOrder::RhsMinusLhs);
    for (f, b) in forward.iter().zip(&backward) {
        assert_eq!(*f, -*b);
    }
    assert!(forward.iter().any(|v| *v != 0.0));
}

#[test]
fn test_gcn_example_through_both_paths() {
    let csr = CsrMatrix::<f32>::from_pattern(3, 3, vec![0, 2, 3, 4], vec![1, 2, 0, 0]).unwrap();
    let table = SigmoidTable::new();
    let kernel = ApplicationKernel::new(ApplicationKind::UnweightedAggregation, SubtractOrder::default(), &table);
    let a = [0.0f32; 6];
    let b = [1.0f32, 1.0, 2.0, 2.0, 3.0, 3.0];
    let call = KernelCall {
        dims: KernelDims { m: 3, n: 3, k: 2 },
        alpha: 1.0,
        beta: 0.0,
        s: csr.view(3),
        a: DenseRef::new(&a, 2),
        b: DenseRef::new(&b, 2),
    };
    for path in [KernelPath::Trusted, KernelPath::Fused] {
        let mut c = vec![0.0f32; 6];
        kernel.run(path, &call, DenseMut::new(&mut c, 2)).unwrap();
        assert_eq!(c, [5.0, 5.0, 1.0, 1.0, 1.0, 1.0], "{}", path.label());
    }
}
