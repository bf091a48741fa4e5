//! One-line CSV benchmark report.

use std::fmt;

use crate::profiling::Timing;

/// Column names, in output order.
pub const CSV_HEADER: &str = "Filename,NNZ,M,N,K,Trusted_exe_time,Test_exe_time,Speedup_exe_time";

/// Result of timing the reference and fused paths on one matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub filename: String,
    pub nnz: usize,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub trusted: Timing,
    pub test: Timing,
}

impl BenchReport {
    /// `trusted / test` per-call time.
    #[inline]
    pub fn speedup(&self) -> f64 {
        self.trusted.exec_secs / self.test.exec_secs
    }

    pub fn csv_header() -> &'static str {
        CSV_HEADER
    }

    /// Times in C-style scientific notation, speedup with six decimals.
    pub fn csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{:.6}",
            self.filename,
            self.nnz,
            self.m,
            self.n,
            self.k,
            scientific(self.trusted.exec_secs),
            scientific(self.test.exec_secs),
            self.speedup()
        )
    }
}

/// `{:.6e}` with a signed exponent of at least two digits: `2.500000e-04`.
pub fn scientific(v: f64) -> String {
    let s = format!("{v:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // inf and NaN
        None => s,
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.csv_line())
    }
}
