//! Static capability probe for a (target, sparse operand, dense operand) triple.

use crate::config::MultOptions;
use crate::core::scalar::Scalar;
use crate::core::traits::{Band, DenseOperand, DenseRows, DenseTarget, SparseOperand, StorageOrder};

/// Facts about one assignment that drive kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The sparse operand is materialized first.
    pub evaluate_left: bool,
    /// The dense operand is materialized first.
    pub evaluate_right: bool,
    /// The SIMD kernel applies.
    pub vectorized: bool,
    /// The unrolled scalar kernel applies.
    pub optimized: bool,
    /// Band of the dense operand.
    pub band: Band,
    /// Target and dense operand both carry zero padding.
    pub padded: bool,
    pub row_major: bool,
}

impl Capabilities {
    pub fn probe<T, C, A, B>(options: &MultOptions, rhs: &B) -> Self
    where
        T: Scalar,
        C: DenseTarget<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        let band = rhs.band();
        let row_major = C::ORDER == StorageOrder::RowMajor;
        let vectorized = options.optimized_kernels
            && !band.is_diagonal()
            && T::SIMD_ENABLED
            && C::SIMD_ENABLED
            && <B::Rows as DenseRows<T>>::SIMD_ENABLED
            && row_major;
        let optimized =
            options.optimized_kernels && !vectorized && !band.is_diagonal() && !T::RESIZABLE;
        Self {
            evaluate_left: A::EVALUATE,
            evaluate_right: B::EVALUATE,
            vectorized,
            optimized,
            band,
            padded: C::PADDED && <B::Rows as DenseRows<T>>::PADDED,
            row_major,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ColMajorMatrix, CsrMatrix, DiagonalMatrix, RowMajorMatrix, ScaledCsr};
    use num_bigint::BigInt;

    #[test]
    fn row_major_f64_is_vectorized() {
        let b = RowMajorMatrix::<f64>::zeros(3, 3);
        let caps = Capabilities::probe::<f64, RowMajorMatrix<f64>, CsrMatrix<f64>, _>(
            &MultOptions::default(),
            &b,
        );
        assert!(caps.vectorized && !caps.optimized && caps.padded);
    }

    #[test]
    fn column_major_target_falls_back_to_optimized() {
        let b = RowMajorMatrix::<f64>::zeros(3, 3);
        let caps = Capabilities::probe::<f64, ColMajorMatrix<f64>, CsrMatrix<f64>, _>(
            &MultOptions::default(),
            &b,
        );
        assert!(!caps.vectorized && caps.optimized && !caps.row_major);
    }

    #[test]
    fn diagonal_and_resizable_use_default() {
        let d = DiagonalMatrix::try_new(RowMajorMatrix::<f64>::identity(3)).unwrap();
        let caps = Capabilities::probe::<f64, RowMajorMatrix<f64>, CsrMatrix<f64>, _>(
            &MultOptions::default(),
            &d,
        );
        assert!(!caps.vectorized && !caps.optimized);

        let b = RowMajorMatrix::<BigInt>::zeros(2, 2);
        let caps = Capabilities::probe::<BigInt, RowMajorMatrix<BigInt>, CsrMatrix<BigInt>, _>(
            &MultOptions::default(),
            &b,
        );
        assert!(!caps.vectorized && !caps.optimized);
    }

    #[test]
    fn evaluation_flags_follow_operands() {
        let b = faer::Mat::<f64>::from_fn(2, 2, |i, j| (i + j) as f64);
        let caps = Capabilities::probe::<f64, RowMajorMatrix<f64>, ScaledCsr<'_, f64>, _>(
            &MultOptions::default().with_optimized_kernels(false),
            &b,
        );
        assert!(caps.evaluate_left && caps.evaluate_right);
        assert!(!caps.vectorized && !caps.optimized);
    }
}
