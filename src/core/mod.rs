//! Core traits, element types and the capability probe.

pub mod probe;
pub mod scalar;
pub mod traits;

pub use probe::Capabilities;
pub use scalar::{Lane, Packed, Scalar};
pub use traits::{
    Band, DenseOperand, DenseRows, DenseTarget, MatShape, SparseKind, SparseOperand, SparseRows,
    StorageOrder,
};
