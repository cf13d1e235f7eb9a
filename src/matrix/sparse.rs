//! Compressed sparse row matrices and the special sparse operands.
//!
//! `CsrMatrix` keeps each row as a contiguous run of `(column, value)` pairs with
//! strictly increasing columns. `IdentityMatrix` and `ZeroMatrix` advertise their
//! kind statically so that products with them short-circuit at construction, and
//! `ScaledCsr` is a lazy `s * A` that has to be evaluated before a kernel reads it.

use std::borrow::Cow;
use std::ops::Range;

use crate::core::scalar::Scalar;
use crate::core::traits::{Band, MatShape, SparseKind, SparseOperand, SparseRows, contains_addr};
use crate::error::MatError;
use crate::matrix::dense::RowMajorMatrix;

/// A sparse matrix stored in the compressed sparse row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    ncols: usize,

    /// A list of `(col, coefficient)` pairs.
    nonzero_values: Vec<(usize, T)>,

    /// `row_indices[i]..row_indices[i + 1]` is the range of row `i` in `nonzero_values`.
    row_indices: Vec<usize>,
}

impl<T: Scalar> CsrMatrix<T> {
    /// An `nrows x ncols` matrix without nonzeros.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            ncols,
            nonzero_values: Vec::new(),
            row_indices: vec![0; nrows + 1],
        }
    }

    /// Build a CSR from raw row-ptr, col-idx, and values.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, MatError> {
        if row_ptr.len() != nrows + 1 {
            return Err(MatError::InvalidSparse(format!(
                "row pointer has {} entries, expected {}",
                row_ptr.len(),
                nrows + 1
            )));
        }
        if col_idx.len() != values.len() {
            return Err(MatError::InvalidSparse(format!(
                "{} column indices for {} values",
                col_idx.len(),
                values.len()
            )));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() {
            return Err(MatError::InvalidSparse(
                "row pointer must start at 0 and end at the number of nonzeros".into(),
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(MatError::InvalidSparse("row pointer is decreasing".into()));
        }
        let m = Self {
            ncols,
            nonzero_values: col_idx.into_iter().zip(values).collect(),
            row_indices: row_ptr,
        };
        m.validate_rows()?;
        Ok(m)
    }

    /// Build from one list of `(column, value)` pairs per row.
    pub fn from_rows(ncols: usize, rows: Vec<Vec<(usize, T)>>) -> Result<Self, MatError> {
        let mut row_indices = Vec::with_capacity(rows.len() + 1);
        row_indices.push(0);
        let mut nonzero_values = Vec::new();
        for row in rows {
            nonzero_values.extend(row);
            row_indices.push(nonzero_values.len());
        }
        let m = Self {
            ncols,
            nonzero_values,
            row_indices,
        };
        m.validate_rows()?;
        Ok(m)
    }

    /// Compress a dense matrix, dropping default-valued elements.
    pub fn from_dense(dense: &RowMajorMatrix<T>) -> Self {
        let mut row_indices = Vec::with_capacity(dense.nrows() + 1);
        row_indices.push(0);
        let mut nonzero_values = Vec::new();
        for i in 0..dense.nrows() {
            nonzero_values.extend(
                dense
                    .row(i)
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_default())
                    .map(|(j, v)| (j, v.clone())),
            );
            row_indices.push(nonzero_values.len());
        }
        Self {
            ncols: dense.ncols(),
            nonzero_values,
            row_indices,
        }
    }

    pub fn to_dense(&self) -> RowMajorMatrix<T> {
        let mut dense = RowMajorMatrix::zeros(self.nrows(), self.ncols);
        for i in 0..self.nrows() {
            for (j, v) in self.sparse_row(i) {
                dense[(i, *j)] = v.clone();
            }
        }
        dense
    }

    fn validate_rows(&self) -> Result<(), MatError> {
        for i in 0..self.nrows() {
            let row = self.sparse_row(i);
            if let Some((j, _)) = row.iter().find(|(j, _)| *j >= self.ncols) {
                return Err(MatError::InvalidSparse(format!(
                    "column {j} in row {i} exceeds {} columns",
                    self.ncols
                )));
            }
            if row.windows(2).any(|w| w[0].0 >= w[1].0) {
                return Err(MatError::InvalidSparse(format!(
                    "columns of row {i} are not strictly increasing"
                )));
            }
        }
        Ok(())
    }

    fn row_index_range(&self, r: usize) -> Range<usize> {
        debug_assert!(r < self.nrows());
        self.row_indices[r]..self.row_indices[r + 1]
    }

    #[must_use]
    pub fn sparse_row(&self, r: usize) -> &[(usize, T)] {
        &self.nonzero_values[self.row_index_range(r)]
    }

    /// Number of stored nonzeros.
    pub fn nnz(&self) -> usize {
        self.nonzero_values.len()
    }

    /// Lazy `scale * self`.
    pub fn scaled(&self, scale: T) -> ScaledCsr<'_, T> {
        ScaledCsr {
            matrix: self,
            scale,
        }
    }
}

impl<T> MatShape for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.row_indices.len() - 1
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Scalar> SparseRows<T> for CsrMatrix<T> {
    fn sparse_row(&self, i: usize) -> &[(usize, T)] {
        CsrMatrix::sparse_row(self, i)
    }
}

fn find_in_row<T: Scalar>(row: &[(usize, T)], j: usize) -> T {
    row.binary_search_by_key(&j, |(c, _)| *c)
        .map(|k| row[k].1.clone())
        .unwrap_or_else(|_| T::zero())
}

impl<T: Scalar> SparseOperand<T> for CsrMatrix<T> {
    type Rows = Self;

    fn get(&self, i: usize, j: usize) -> T {
        find_in_row(self.sparse_row(i), j)
    }

    fn row_entries(&self, i: usize) -> Cow<'_, [(usize, T)]> {
        Cow::Borrowed(self.sparse_row(i))
    }

    fn composite(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        contains_addr(&self.nonzero_values, addr)
    }
}

/// Sparse `n x n` identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityMatrix<T> {
    inner: CsrMatrix<T>,
}

impl<T: Scalar> IdentityMatrix<T> {
    pub fn new(n: usize) -> Self {
        Self {
            inner: CsrMatrix {
                ncols: n,
                nonzero_values: (0..n).map(|i| (i, T::one())).collect(),
                row_indices: (0..=n).collect(),
            },
        }
    }
}

impl<T> MatShape for IdentityMatrix<T> {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}

impl<T: Scalar> SparseOperand<T> for IdentityMatrix<T> {
    const KIND: SparseKind = SparseKind::Identity;

    type Rows = CsrMatrix<T>;

    fn band(&self) -> Band {
        Band::Diagonal
    }

    fn get(&self, i: usize, j: usize) -> T {
        if i == j { T::one() } else { T::zero() }
    }

    fn row_entries(&self, i: usize) -> Cow<'_, [(usize, T)]> {
        Cow::Borrowed(self.inner.sparse_row(i))
    }

    fn composite(&self) -> Cow<'_, CsrMatrix<T>> {
        Cow::Borrowed(&self.inner)
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.inner.is_aliased(addr)
    }
}

/// Sparse matrix without any nonzeros.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroMatrix<T> {
    inner: CsrMatrix<T>,
}

impl<T: Scalar> ZeroMatrix<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            inner: CsrMatrix::new(nrows, ncols),
        }
    }
}

impl<T> MatShape for ZeroMatrix<T> {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}

impl<T: Scalar> SparseOperand<T> for ZeroMatrix<T> {
    const KIND: SparseKind = SparseKind::Zero;

    type Rows = CsrMatrix<T>;

    fn get(&self, _i: usize, _j: usize) -> T {
        T::zero()
    }

    fn row_entries(&self, _i: usize) -> Cow<'_, [(usize, T)]> {
        Cow::Borrowed(&[])
    }

    fn composite(&self) -> Cow<'_, CsrMatrix<T>> {
        Cow::Borrowed(&self.inner)
    }

    fn is_aliased(&self, _addr: *const ()) -> bool {
        false
    }
}

/// Lazily scaled CSR matrix, `scale * matrix`.
#[derive(Debug, Clone)]
pub struct ScaledCsr<'a, T> {
    matrix: &'a CsrMatrix<T>,
    scale: T,
}

impl<T: Scalar> ScaledCsr<'_, T> {
    fn scale_row(&self, i: usize) -> Vec<(usize, T)> {
        self.matrix
            .sparse_row(i)
            .iter()
            .map(|(j, v)| (*j, self.scale.clone() * v.clone()))
            .collect()
    }

    pub fn evaluate(&self) -> CsrMatrix<T> {
        let mut nonzero_values = Vec::with_capacity(self.matrix.nnz());
        for i in 0..self.matrix.nrows() {
            nonzero_values.extend(self.scale_row(i));
        }
        CsrMatrix {
            ncols: self.matrix.ncols,
            nonzero_values,
            row_indices: self.matrix.row_indices.clone(),
        }
    }
}

impl<T> MatShape for ScaledCsr<'_, T> {
    fn nrows(&self) -> usize {
        self.matrix.nrows()
    }
    fn ncols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<T: Scalar> SparseOperand<T> for ScaledCsr<'_, T> {
    const EVALUATE: bool = true;

    type Rows = CsrMatrix<T>;

    fn get(&self, i: usize, j: usize) -> T {
        self.scale.clone() * self.matrix.get(i, j)
    }

    fn row_entries(&self, i: usize) -> Cow<'_, [(usize, T)]> {
        Cow::Owned(self.scale_row(i))
    }

    fn composite(&self) -> Cow<'_, CsrMatrix<T>> {
        Cow::Owned(self.evaluate())
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.matrix.is_aliased(addr)
    }
}
