//! Dense matrices: padded row-major storage, a column-major target, borrowed
//! row-major views and interop with `faer::Mat`.
//!
//! `RowMajorMatrix` rounds every row up to a multiple of the SIMD lane count of
//! its element type and keeps the padding zero, so packed kernels may read and
//! write whole registers at the end of a row.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Index, IndexMut};

use faer::Mat;

use crate::core::scalar::{Scalar, lanes};
use crate::core::traits::{
    DenseOperand, DenseRows, DenseTarget, MatShape, StorageOrder, contains_addr,
};
use crate::error::MatError;
use crate::matrix::block::DenseBlockMut;

/// Row stride for `ncols` columns of `T`.
fn padded_spacing<T: Scalar>(ncols: usize) -> usize {
    if T::SIMD_ENABLED {
        ncols.next_multiple_of(lanes::<T>())
    } else {
        ncols
    }
}

#[derive(Clone)]
pub struct RowMajorMatrix<T> {
    values: Vec<T>,
    nrows: usize,
    ncols: usize,
    spacing: usize,
}

impl<T: Scalar> RowMajorMatrix<T> {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        let spacing = padded_spacing::<T>(ncols);
        Self {
            values: vec![T::zero(); nrows * spacing],
            nrows,
            ncols,
            spacing,
        }
    }

    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut m = Self::zeros(nrows, ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                m.values[i * m.spacing + j] = f(i, j);
            }
        }
        m
    }

    /// Build from unpadded row-major storage.
    pub fn from_row_major(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self, MatError> {
        if data.len() != nrows * ncols {
            return Err(MatError::InvalidDense(format!(
                "expected {} values for a {nrows}x{ncols} matrix, got {}",
                nrows * ncols,
                data.len()
            )));
        }
        let spacing = padded_spacing::<T>(ncols);
        if spacing == ncols {
            return Ok(Self {
                values: data,
                nrows,
                ncols,
                spacing,
            });
        }
        let mut values = Vec::with_capacity(nrows * spacing);
        let mut rest = data.into_iter();
        for _ in 0..nrows {
            values.extend(rest.by_ref().take(ncols));
            values.resize(values.len() + spacing - ncols, T::zero());
        }
        Ok(Self {
            values,
            nrows,
            ncols,
            spacing,
        })
    }

    /// Build from a list of equally long rows.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, MatError> {
        let ncols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * ncols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(MatError::InvalidDense(format!(
                    "row {i} has {} columns, expected {ncols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_row_major(rows.len(), ncols, data)
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Distance between the starts of consecutive rows.
    pub fn spacing(&self) -> usize {
        self.spacing
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.values[i * self.spacing..i * self.spacing + self.ncols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.values[i * self.spacing..i * self.spacing + self.ncols]
    }

    /// Copy into a column-major `faer::Mat`.
    pub fn to_faer(&self) -> Mat<T> {
        Mat::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)].clone())
    }

    pub fn from_faer(m: &Mat<T>) -> Self {
        Self::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)].clone())
    }

    pub fn to_col_major(&self) -> ColMajorMatrix<T> {
        ColMajorMatrix::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)].clone())
    }

    pub fn map(&self, mut f: impl FnMut(&T) -> T) -> Self {
        Self::from_fn(self.nrows, self.ncols, |i, j| f(&self[(i, j)]))
    }

    /// Rows as nested vectors, without padding.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        (0..self.nrows).map(|i| self.row(i).to_vec()).collect()
    }
}

impl<T: Scalar> PartialEq for RowMajorMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && (0..self.nrows).all(|i| self.row(i) == other.row(i))
    }
}

impl<T: Scalar> fmt::Debug for RowMajorMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMajorMatrix")
            .field("nrows", &self.nrows)
            .field("ncols", &self.ncols)
            .field("rows", &self.to_rows())
            .finish()
    }
}

impl<T: Scalar> Index<(usize, usize)> for RowMajorMatrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(j < self.ncols, "column index {j} out of bounds");
        &self.values[i * self.spacing + j]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for RowMajorMatrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(j < self.ncols, "column index {j} out of bounds");
        &mut self.values[i * self.spacing + j]
    }
}

impl<T> MatShape for RowMajorMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Scalar> DenseRows<T> for RowMajorMatrix<T> {
    const PADDED: bool = true;

    fn row(&self, i: usize) -> &[T] {
        RowMajorMatrix::row(self, i)
    }

    fn padded_row(&self, i: usize) -> &[T] {
        &self.values[i * self.spacing..(i + 1) * self.spacing]
    }
}

impl<T: Scalar> DenseOperand<T> for RowMajorMatrix<T> {
    type Rows = Self;

    fn get(&self, i: usize, j: usize) -> T {
        self[(i, j)].clone()
    }

    fn composite(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        contains_addr(&self.values, addr)
    }
}

impl<T: Scalar> DenseTarget<T> for RowMajorMatrix<T> {
    const ORDER: StorageOrder = StorageOrder::RowMajor;
    const PADDED: bool = true;

    fn block_mut(&mut self) -> DenseBlockMut<'_, T> {
        DenseBlockMut::new(
            &mut self.values,
            StorageOrder::RowMajor,
            self.spacing,
            0..self.nrows,
            0..self.ncols,
        )
    }

    fn data_ptr(&self) -> *const () {
        self.values.as_ptr() as *const ()
    }
}

/// Column-major dense matrix. Only usable as a target; kernels writing into it
/// never take the SIMD path.
#[derive(Debug, Clone, PartialEq)]
pub struct ColMajorMatrix<T> {
    values: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Scalar> ColMajorMatrix<T> {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            values: vec![T::zero(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut values = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                values.push(f(i, j));
            }
        }
        Self {
            values,
            nrows,
            ncols,
        }
    }

    pub fn col(&self, j: usize) -> &[T] {
        &self.values[j * self.nrows..(j + 1) * self.nrows]
    }

    pub fn to_row_major(&self) -> RowMajorMatrix<T> {
        RowMajorMatrix::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)].clone())
    }
}

impl<T: Scalar> Index<(usize, usize)> for ColMajorMatrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.nrows, "row index {i} out of bounds");
        &self.values[j * self.nrows + i]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for ColMajorMatrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(i < self.nrows, "row index {i} out of bounds");
        &mut self.values[j * self.nrows + i]
    }
}

impl<T> MatShape for ColMajorMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Scalar> DenseTarget<T> for ColMajorMatrix<T> {
    const ORDER: StorageOrder = StorageOrder::ColumnMajor;
    const SIMD_ENABLED: bool = false;

    fn block_mut(&mut self) -> DenseBlockMut<'_, T> {
        DenseBlockMut::new(
            &mut self.values,
            StorageOrder::ColumnMajor,
            self.nrows,
            0..self.nrows,
            0..self.ncols,
        )
    }

    fn data_ptr(&self) -> *const () {
        self.values.as_ptr() as *const ()
    }
}

/// Borrowed, unpadded row-major matrix.
#[derive(Debug, Clone)]
pub struct DenseView<'a, T> {
    data: &'a [T],
    nrows: usize,
    ncols: usize,
}

impl<'a, T: Scalar> DenseView<'a, T> {
    pub fn new(data: &'a [T], nrows: usize, ncols: usize) -> Result<Self, MatError> {
        if data.len() != nrows * ncols {
            return Err(MatError::InvalidDense(format!(
                "view of {nrows}x{ncols} needs {} values, got {}",
                nrows * ncols,
                data.len()
            )));
        }
        Ok(Self { data, nrows, ncols })
    }
}

impl<T> MatShape for DenseView<'_, T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
}

impl<T: Scalar> DenseRows<T> for DenseView<'_, T> {
    fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }
}

impl<'a, T: Scalar> DenseOperand<T> for DenseView<'a, T> {
    type Rows = Self;

    fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.ncols + j].clone()
    }

    fn composite(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        contains_addr(self.data, addr)
    }
}

impl<T> MatShape for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

/// Column-major faer matrices are copied into row-major storage before use.
impl<T: Scalar> DenseOperand<T> for Mat<T> {
    const EVALUATE: bool = true;

    type Rows = RowMajorMatrix<T>;

    fn get(&self, i: usize, j: usize) -> T {
        self[(i, j)].clone()
    }

    fn composite(&self) -> Cow<'_, RowMajorMatrix<T>> {
        Cow::Owned(RowMajorMatrix::from_faer(self))
    }

    fn is_aliased(&self, _addr: *const ()) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_zero_and_hidden() {
        let m = RowMajorMatrix::from_row_major(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.spacing(), 4);
        assert_eq!(DenseRows::padded_row(&m, 1), &[4.0, 5.0, 6.0, 0.0]);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m[(0, 2)], 3.0);
    }

    #[test]
    fn non_simd_types_are_unpadded() {
        let m = RowMajorMatrix::<i64>::zeros(3, 5);
        assert_eq!(m.spacing(), 5);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = RowMajorMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, MatError::InvalidDense(_)));
        assert!(RowMajorMatrix::<f64>::from_row_major(2, 2, vec![1.0]).is_err());
    }

    #[test]
    fn faer_and_column_major_round_trip() {
        let m = RowMajorMatrix::from_fn(3, 2, |i, j| (i * 10 + j) as f64);
        let f = m.to_faer();
        assert_eq!(f[(2, 1)], 21.0);
        assert_eq!(RowMajorMatrix::from_faer(&f), m);
        let c = m.to_col_major();
        assert_eq!(c.col(1), &[1.0, 11.0, 21.0]);
        assert_eq!(c.to_row_major(), m);
    }

    #[test]
    fn view_checks_length() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let v = DenseView::new(&data, 2, 2).unwrap();
        assert_eq!(DenseOperand::get(&v, 1, 0), 3.0);
        assert!(DenseView::new(&data, 3, 2).is_err());
    }
}
