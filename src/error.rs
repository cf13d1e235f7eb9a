use thiserror::Error;

// Unified error type for spdmm

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatError {
    #[error("matrix sizes do not match in {context}: {left:?} vs {right:?}")]
    DimensionMismatch {
        context: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error("invalid {0} matrix declaration")]
    InvalidDeclaration(&'static str),
    #[error("invalid {axis} access index {index} (extent {extent})")]
    OutOfRange {
        axis: &'static str,
        index: usize,
        extent: usize,
    },
    #[error("invalid sparse matrix: {0}")]
    InvalidSparse(String),
    #[error("invalid dense matrix: {0}")]
    InvalidDense(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

impl MatError {
    pub(crate) fn mismatch(
        context: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    ) -> Self {
        MatError::DimensionMismatch { context, left, right }
    }
}
