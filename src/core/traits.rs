//! Core capability traits for spdmm.
//!
//! The engine never depends on concrete containers. Operands and targets are
//! described by the traits below: shape, band structure, row access and whether
//! the operand has to be materialized into a temporary before a kernel can read it.

use std::borrow::Cow;

use crate::core::scalar::Scalar;
use crate::matrix::block::DenseBlockMut;

/// Shape queries shared by every matrix-like type.
pub trait MatShape {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;

    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }
}

/// Static band structure of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Band {
    #[default]
    General,
    Lower,
    StrictlyLower,
    Upper,
    StrictlyUpper,
    Diagonal,
}

impl Band {
    /// No nonzeros above the diagonal.
    pub const fn is_lower(self) -> bool {
        matches!(self, Band::Lower | Band::StrictlyLower | Band::Diagonal)
    }

    /// No nonzeros below the diagonal.
    pub const fn is_upper(self) -> bool {
        matches!(self, Band::Upper | Band::StrictlyUpper | Band::Diagonal)
    }

    pub const fn is_strictly_lower(self) -> bool {
        matches!(self, Band::StrictlyLower)
    }

    pub const fn is_strictly_upper(self) -> bool {
        matches!(self, Band::StrictlyUpper)
    }

    pub const fn is_diagonal(self) -> bool {
        matches!(self, Band::Diagonal)
    }

    pub const fn is_triangular(self) -> bool {
        !matches!(self, Band::General)
    }

    /// Whether element `(i, j)` may be nonzero.
    pub const fn admits(self, i: usize, j: usize) -> bool {
        match self {
            Band::General => true,
            Band::Lower => j <= i,
            Band::StrictlyLower => j < i,
            Band::Upper => j >= i,
            Band::StrictlyUpper => j > i,
            Band::Diagonal => i == j,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Band::General => "general",
            Band::Lower => "lower",
            Band::StrictlyLower => "strictly lower",
            Band::Upper => "upper",
            Band::StrictlyUpper => "strictly upper",
            Band::Diagonal => "diagonal",
        }
    }
}

/// Compile-time kind of a sparse operand, used by the construction fast paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseKind {
    General,
    Identity,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOrder {
    RowMajor,
    ColumnMajor,
}

/// Evaluated row-major sparse storage.
///
/// Each row is a slice of `(column, value)` pairs with strictly increasing columns.
pub trait SparseRows<T>: MatShape + Sync {
    fn sparse_row(&self, i: usize) -> &[(usize, T)];

    fn nonzeros(&self, i: usize) -> usize {
        self.sparse_row(i).len()
    }
}

/// Left operand of a sparse-dense product.
pub trait SparseOperand<T: Scalar>: MatShape {
    /// The operand is an expression and is materialized before the kernels run.
    const EVALUATE: bool = false;
    const KIND: SparseKind = SparseKind::General;

    type Rows: SparseRows<T> + Clone;

    fn band(&self) -> Band {
        Band::General
    }

    /// Element `(i, j)`; zero for structural zeros.
    fn get(&self, i: usize, j: usize) -> T;

    /// Nonzeros of row `i`.
    fn row_entries(&self, i: usize) -> Cow<'_, [(usize, T)]>;

    /// Kernel-ready storage, borrowed when no evaluation is needed.
    fn composite(&self) -> Cow<'_, Self::Rows>;

    /// Whether the operand's storage contains `addr`.
    fn is_aliased(&self, addr: *const ()) -> bool;
}

/// Evaluated row-major dense storage.
pub trait DenseRows<T: Scalar>: MatShape + Sync {
    /// Rows are followed by zero padding up to a multiple of the lane count.
    const PADDED: bool = false;
    const SIMD_ENABLED: bool = T::SIMD_ENABLED;

    /// Row `i`, exactly `ncols()` elements.
    fn row(&self, i: usize) -> &[T];

    /// Row `i` including padding.
    fn padded_row(&self, i: usize) -> &[T] {
        self.row(i)
    }
}

/// Right operand of a sparse-dense product.
pub trait DenseOperand<T: Scalar>: MatShape {
    const EVALUATE: bool = false;

    type Rows: DenseRows<T> + Clone;

    fn band(&self) -> Band {
        Band::General
    }

    fn get(&self, i: usize, j: usize) -> T;

    fn composite(&self) -> Cow<'_, Self::Rows>;

    fn is_aliased(&self, addr: *const ()) -> bool;
}

/// Dense matrix a product can be written into.
pub trait DenseTarget<T: Scalar>: MatShape {
    const ORDER: StorageOrder;
    const PADDED: bool = false;
    const SIMD_ENABLED: bool = T::SIMD_ENABLED;

    /// Mutable view over the whole matrix.
    fn block_mut(&mut self) -> DenseBlockMut<'_, T>;

    /// Start of the underlying storage, for alias checks.
    fn data_ptr(&self) -> *const ();
}

/// Whether `addr` points into `slice`.
pub(crate) fn contains_addr<T>(slice: &[T], addr: *const ()) -> bool {
    let range = slice.as_ptr_range();
    let addr = addr as *const T;
    !slice.is_empty() && range.start <= addr && addr < range.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_predicates() {
        assert!(Band::Diagonal.is_lower() && Band::Diagonal.is_upper());
        assert!(Band::StrictlyUpper.is_upper() && !Band::StrictlyUpper.is_lower());
        assert!(!Band::General.is_triangular());
        assert!(Band::Lower.admits(2, 2) && !Band::StrictlyLower.admits(2, 2));
        assert!(Band::StrictlyUpper.admits(0, 1) && !Band::Upper.admits(1, 0));
    }

    #[test]
    fn addr_containment() {
        let v = vec![1.0f64, 2.0, 3.0];
        assert!(contains_addr(&v, v[1..].as_ptr() as *const ()));
        assert!(!contains_addr(&v, v.as_ptr_range().end as *const ()));
        let empty: Vec<f64> = Vec::new();
        assert!(!contains_addr(&empty, empty.as_ptr() as *const ()));
    }
}
