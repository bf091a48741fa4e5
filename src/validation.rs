//! Validation utilities for sparse structures and kernel arguments.
//!
//! All functions return `Result<_, String>`; callers map the message into
//! the matching `HarnessError` variant. Size arithmetic uses `checked_mul`
//! so oversized requests fail instead of wrapping.

/// Validate that the three problem dimensions are non-zero.
#[inline]
pub fn validate_kernel_dims(m: usize, n: usize, k: usize) -> Result<(), String> {
    if m == 0 || n == 0 || k == 0 {
        return Err(format!("M={m}, N={n}, K={k}: all dimensions must be > 0"));
    }
    Ok(())
}

/// Validate a leading dimension against the logical row width.
#[inline]
pub fn validate_leading_dim(ld: usize, k: usize, name: &str) -> Result<(), String> {
    if ld < k {
        return Err(format!("{name}: leading dimension {ld} < K={k}"));
    }
    Ok(())
}

/// Number of elements a row-major `rows x k` operand with stride `ld` spans.
#[inline]
pub fn dense_extent(rows: usize, ld: usize, k: usize) -> Result<usize, String> {
    if rows == 0 {
        return Ok(0);
    }
    (rows - 1)
        .checked_mul(ld)
        .and_then(|v| v.checked_add(k))
        .ok_or_else(|| "dense extent overflow".to_string())
}

/// Validate that a dense buffer covers `rows` rows of width `k`.
#[inline]
pub fn validate_dense_len(
    actual: usize,
    rows: usize,
    ld: usize,
    k: usize,
    name: &str,
) -> Result<(), String> {
    validate_leading_dim(ld, k, name)?;
    let needed = dense_extent(rows, ld, k)?;
    if actual < needed {
        return Err(format!(
            "{name} len {actual} < {needed} required for {rows} rows (ld={ld}, K={k})"
        ));
    }
    Ok(())
}

/// Validate the CSR invariants: `row_ptr` has `rows + 1` non-decreasing
/// entries starting at zero and ending at `nnz`, every column index is
/// below `cols`.
pub fn validate_csr_structure(
    rows: usize,
    cols: usize,
    row_ptr: &[usize],
    col_index: &[usize],
) -> Result<(), String> {
    if row_ptr.len() != rows + 1 {
        return Err(format!("row_ptr len {} != rows + 1 = {}", row_ptr.len(), rows + 1));
    }
    if row_ptr[0] != 0 {
        return Err(format!("row_ptr[0] = {} != 0", row_ptr[0]));
    }
    if let Some(i) = row_ptr.windows(2).position(|w| w[1] < w[0]) {
        return Err(format!(
            "row_ptr decreases at row {i}: {} > {}",
            row_ptr[i],
            row_ptr[i + 1]
        ));
    }
    let nnz = row_ptr[rows];
    if nnz != col_index.len() {
        return Err(format!("row_ptr[rows] = {nnz} != nnz = {}", col_index.len()));
    }
    if let Some(e) = col_index.iter().position(|&c| c >= cols) {
        return Err(format!("col_index[{e}] = {} out of range for {cols} columns", col_index[e]));
    }
    Ok(())
}

/// Validate the nonzero-value array length.
#[inline]
pub fn validate_values_len(actual: usize, nnz: usize) -> Result<(), String> {
    if actual != nnz {
        return Err(format!("values len {actual} != nnz {nnz}"));
    }
    Ok(())
}

/// Multiply two sizes, reporting which quantity overflowed.
#[inline]
pub fn checked_size(a: usize, b: usize, name: &str) -> Result<usize, String> {
    a.checked_mul(b).ok_or_else(|| format!("{name} overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_kernel_dims() {
        assert!(validate_kernel_dims(4, 4, 128).is_ok());
        assert!(validate_kernel_dims(0, 4, 128).is_err());
        assert!(validate_kernel_dims(4, 0, 128).is_err());
        assert!(validate_kernel_dims(4, 4, 0).is_err());
    }

    #[test]
    fn test_dense_extent() {
        assert_eq!(dense_extent(0, 8, 4).unwrap(), 0);
        assert_eq!(dense_extent(1, 8, 4).unwrap(), 4);
        assert_eq!(dense_extent(3, 8, 4).unwrap(), 20);
        assert!(dense_extent(usize::MAX, 2, 1).is_err());
    }

    #[test]
    fn test_validate_dense_len() {
        assert!(validate_dense_len(20, 3, 8, 4, "A").is_ok());
        assert!(validate_dense_len(19, 3, 8, 4, "A").is_err());
        assert!(validate_dense_len(100, 3, 2, 4, "A").is_err());
    }

    #[test]
    fn test_csr_structure_ok() {
        assert!(validate_csr_structure(3, 3, &[0, 2, 3, 4], &[1, 2, 0, 0]).is_ok());
        assert!(validate_csr_structure(2, 5, &[0, 0, 0], &[]).is_ok());
    }

    #[test]
    fn test_csr_structure_errors() {
        // wrong length
        assert!(validate_csr_structure(3, 3, &[0, 2, 4], &[1, 2, 0, 0]).is_err());
        // decreasing
        let err = validate_csr_structure(3, 3, &[0, 3, 2, 4], &[1, 2, 0, 0]).unwrap_err();
        assert!(err.contains("decreases at row 1"), "{err}");
        // nnz mismatch
        assert!(validate_csr_structure(3, 3, &[0, 2, 3, 5], &[1, 2, 0, 0]).is_err());
        // column out of range
        let err = validate_csr_structure(3, 3, &[0, 2, 3, 4], &[1, 3, 0, 0]).unwrap_err();
        assert!(err.contains("col_index[1]"), "{err}");
    }
}
