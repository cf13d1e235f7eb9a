//! Reference multiplication used to validate the kernels.

use crate::core::scalar::Scalar;
use crate::core::traits::{DenseOperand, SparseOperand};
use crate::error::MatError;
use crate::matrix::dense::RowMajorMatrix;

/// `A * B` by the textbook triple loop over element access.
///
/// Ignores every structural shortcut, so it is slow but independent of the
/// kernel machinery.
pub fn reference_product<T, A, B>(a: &A, b: &B) -> Result<RowMajorMatrix<T>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    if a.ncols() != b.nrows() {
        return Err(MatError::mismatch("reference product", a.shape(), b.shape()));
    }
    Ok(RowMajorMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        let mut acc = T::zero();
        for k in 0..a.ncols() {
            acc += a.get(i, k) * b.get(k, j);
        }
        acc
    }))
}
