//! Matrix Market coordinate-format reader.
//!
//! Supports `real`, `integer` and `pattern` fields with `general`,
//! `symmetric` and `skew-symmetric` symmetry. Pattern entries get weight 1.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{HarnessError, HarnessResult};
use crate::sparse::CscMatrix;
use crate::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Real,
    Integer,
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

/// Load a `.mtx` file as a sorted CSC matrix.
pub fn read_matrix_market<T: Real>(path: &Path) -> HarnessResult<CscMatrix<T>> {
    let file = File::open(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut csc = parse_matrix_market(BufReader::new(file), path)?;
    csc.sort_indices();
    log::debug!(
        "loaded {}: {}x{} with {} nonzeros",
        path.display(),
        csc.rows(),
        csc.cols(),
        csc.nnz()
    );
    Ok(csc)
}

/// Parse Matrix Market text. `path` is only used in error messages.
pub fn parse_matrix_market<T: Real, R: BufRead>(reader: R, path: &Path) -> HarnessResult<CscMatrix<T>> {
    let err = |line: usize, msg: String| HarnessError::Parse {
        path: path.to_path_buf(),
        line,
        msg,
    };

    let mut lines = reader.lines().enumerate();
    let (field, symmetry) = match lines.next() {
        Some((_, Ok(banner))) => parse_banner(&banner).map_err(|m| err(1, m))?,
        Some((_, Err(source))) => return Err(HarnessError::Io { path: path.to_path_buf(), source }),
        None => return Err(err(1, "empty file".into())),
    };

    let mut size: Option<(usize, usize, usize)> = None;
    let mut entries: Vec<(usize, usize, T)> = Vec::new();
    let mut read = 0usize;
    let mut last_line = 1usize;

    for (idx, line) in lines {
        let lineno = idx + 1;
        last_line = lineno;
        let line = line.map_err(|source| HarnessError::Io { path: path.to_path_buf(), source })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let mut tok = line.split_whitespace();
        let Some((rows, cols, declared)) = size else {
            let mut next = || -> Result<usize, String> {
                tok.next()
                    .ok_or_else(|| "size line needs rows, cols, entries".to_string())?
                    .parse::<usize>()
                    .map_err(|e| format!("bad size field: {e}"))
            };
            let dims = (next().map_err(|m| err(lineno, m))?, next().map_err(|m| err(lineno, m))?, next().map_err(|m| err(lineno, m))?);
            let cap = if symmetry == Symmetry::General { dims.2 } else { dims.2.saturating_mul(2) };
            entries.reserve(cap);
            size = Some(dims);
            continue;
        };

        if read == declared {
            return Err(err(lineno, format!("more entries than the declared {declared}")));
        }
        read += 1;

        let r = parse_index(tok.next(), rows).map_err(|m| err(lineno, m))?;
        let c = parse_index(tok.next(), cols).map_err(|m| err(lineno, m))?;
        let v = match field {
            Field::Pattern => T::one(),
            Field::Real | Field::Integer => {
                let raw = tok.next().ok_or_else(|| err(lineno, "missing value".into()))?;
                let v: f64 = raw.parse().map_err(|e| err(lineno, format!("bad value {raw:?}: {e}")))?;
                T::from_f64(v)
            }
        };
        entries.push((r, c, v));
        if r != c {
            match symmetry {
                Symmetry::General => {}
                Symmetry::Symmetric => entries.push((c, r, v)),
                Symmetry::SkewSymmetric => entries.push((c, r, -v)),
            }
        }
    }

    let (rows, cols, declared) = size.ok_or_else(|| err(1, "missing size line".into()))?;
    if read < declared {
        return Err(err(last_line + 1, format!("file ends after {read} of the declared {declared} entries")));
    }
    CscMatrix::from_triplets(rows, cols, &entries)
}

fn parse_banner(banner: &str) -> Result<(Field, Symmetry), String> {
    let lower = banner.to_ascii_lowercase();
    let parts: Vec<&str> = lower.split_whitespace().collect();
    if parts.len() < 5 || parts[0] != "%%matrixmarket" || parts[1] != "matrix" {
        return Err(format!("not a Matrix Market banner: {banner:?}"));
    }
    if parts[2] != "coordinate" {
        return Err(format!("unsupported format {:?}, only coordinate is read", parts[2]));
    }
    let field = match parts[3] {
        "real" | "double" => Field::Real,
        "integer" => Field::Integer,
        "pattern" => Field::Pattern,
        other => return Err(format!("unsupported field {other:?}")),
    };
    let symmetry = match parts[4] {
        "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        "skew-symmetric" => Symmetry::SkewSymmetric,
        other => return Err(format!("unsupported symmetry {other:?}")),
    };
    Ok((field, symmetry))
}

fn parse_index(tok: Option<&str>, bound: usize) -> Result<usize, String> {
    let raw = tok.ok_or_else(|| "missing index".to_string())?;
    let one_based: usize = raw.parse().map_err(|e| format!("bad index {raw:?}: {e}"))?;
    if one_based == 0 || one_based > bound {
        return Err(format!("index {one_based} outside 1..={bound}"));
    }
    Ok(one_based - 1)
}
