//! Matrix module: dense and sparse containers, band adaptors and target blocks.

pub mod banded;
pub mod block;
pub mod dense;
pub mod sparse;

pub use banded::{
    BandCheck, BandTag, Banded, DiagonalBand, DiagonalMatrix, LowerBand, LowerMatrix,
    StrictlyLowerBand, StrictlyLowerMatrix, StrictlyUpperBand, StrictlyUpperMatrix, UpperBand,
    UpperMatrix,
};
pub use block::DenseBlockMut;
pub use dense::{ColMajorMatrix, DenseView, RowMajorMatrix};
pub use sparse::{CsrMatrix, IdentityMatrix, ScaledCsr, ZeroMatrix};
