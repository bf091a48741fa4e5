use std::path::PathBuf;

use thiserror::Error;

/// Every way a harness run can fail. All variants are fatal for the run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("need input file")]
    MissingInput,
    #[error("unknown application kernel '{0}' (expected one of t, s, f, m, g)")]
    UnknownApplication(char),
    #[error("unsupported operation message {bits:#07x}: {reason}")]
    UnsupportedOperation { bits: u32, reason: String },
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
    #[error("invalid sparse matrix: {0}")]
    InvalidSparse(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("correctness check failed: {count} mismatched elements")]
    CorrectnessMismatch { count: usize },
    #[error("workspace allocation of {bytes} bytes failed")]
    AllocationFailure { bytes: usize },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {msg}")]
    Parse { path: PathBuf, line: usize, msg: String },
    #[error("thread pool: {0}")]
    ThreadPool(String),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    pub(crate) fn dims(msg: impl Into<String>) -> Self {
        HarnessError::InvalidDimensions(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(HarnessError::MissingInput.to_string(), "need input file");
        let e = HarnessError::UnsupportedOperation { bits: 0x10001, reason: "no vector op".into() };
        assert_eq!(e.to_string(), "unsupported operation message 0x10001: no vector op");
        let e = HarnessError::CorrectnessMismatch { count: 3 };
        assert!(e.to_string().contains("3 mismatched"));
    }
}
