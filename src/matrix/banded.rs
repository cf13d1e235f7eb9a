//! Band adaptors: wrap a square matrix and advertise that it is lower, upper,
//! strictly triangular or diagonal.
//!
//! The adaptors do not change storage. They only report a `Band`, which the
//! range engine uses to skip work that can only produce zeros. `try_new` checks
//! that the wrapped matrix really has no nonzeros outside the band.

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::core::scalar::Scalar;
use crate::core::traits::{Band, DenseOperand, MatShape, SparseOperand};
use crate::error::MatError;
use crate::matrix::dense::RowMajorMatrix;
use crate::matrix::sparse::CsrMatrix;

/// Marker for a band shape.
pub trait BandTag {
    const BAND: Band;
}

macro_rules! band_tag {
    ($($name:ident => $band:expr),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name;

            impl BandTag for $name {
                const BAND: Band = $band;
            }
        )*
    };
}

band_tag! {
    LowerBand => Band::Lower,
    StrictlyLowerBand => Band::StrictlyLower,
    UpperBand => Band::Upper,
    StrictlyUpperBand => Band::StrictlyUpper,
    DiagonalBand => Band::Diagonal,
}

/// Location of the first stored nonzero outside `band`, if any.
pub trait BandCheck {
    fn first_outside(&self, band: Band) -> Option<(usize, usize)>;
}

impl<T: Scalar> BandCheck for RowMajorMatrix<T> {
    fn first_outside(&self, band: Band) -> Option<(usize, usize)> {
        (0..self.nrows()).find_map(|i| {
            self.row(i)
                .iter()
                .enumerate()
                .find(|(j, v)| !band.admits(i, *j) && !v.is_default())
                .map(|(j, _)| (i, j))
        })
    }
}

impl<T: Scalar> BandCheck for CsrMatrix<T> {
    fn first_outside(&self, band: Band) -> Option<(usize, usize)> {
        (0..self.nrows()).find_map(|i| {
            self.sparse_row(i)
                .iter()
                .find(|(j, v)| !band.admits(i, *j) && !v.is_default())
                .map(|(j, _)| (i, *j))
        })
    }
}

/// A square matrix known to be zero outside the band `S`.
#[derive(Debug, Clone, PartialEq)]
pub struct Banded<M, S> {
    inner: M,
    _band: PhantomData<S>,
}

pub type LowerMatrix<M> = Banded<M, LowerBand>;
pub type StrictlyLowerMatrix<M> = Banded<M, StrictlyLowerBand>;
pub type UpperMatrix<M> = Banded<M, UpperBand>;
pub type StrictlyUpperMatrix<M> = Banded<M, StrictlyUpperBand>;
pub type DiagonalMatrix<M> = Banded<M, DiagonalBand>;

impl<M: MatShape + BandCheck, S: BandTag> Banded<M, S> {
    pub fn try_new(inner: M) -> Result<Self, MatError> {
        if !inner.is_square() || inner.first_outside(S::BAND).is_some() {
            return Err(MatError::InvalidDeclaration(S::BAND.name()));
        }
        Ok(Self {
            inner,
            _band: PhantomData,
        })
    }
}

impl<M, S> Banded<M, S> {
    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: MatShape, S> MatShape for Banded<M, S> {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}

impl<T: Scalar, M: SparseOperand<T>, S: BandTag> SparseOperand<T> for Banded<M, S> {
    const EVALUATE: bool = M::EVALUATE;

    type Rows = M::Rows;

    fn band(&self) -> Band {
        S::BAND
    }

    fn get(&self, i: usize, j: usize) -> T {
        if S::BAND.admits(i, j) {
            self.inner.get(i, j)
        } else {
            T::zero()
        }
    }

    fn row_entries(&self, i: usize) -> Cow<'_, [(usize, T)]> {
        self.inner.row_entries(i)
    }

    fn composite(&self) -> Cow<'_, M::Rows> {
        self.inner.composite()
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.inner.is_aliased(addr)
    }
}

impl<T: Scalar, M: DenseOperand<T>, S: BandTag> DenseOperand<T> for Banded<M, S> {
    const EVALUATE: bool = M::EVALUATE;

    type Rows = M::Rows;

    fn band(&self) -> Band {
        S::BAND
    }

    fn get(&self, i: usize, j: usize) -> T {
        if S::BAND.admits(i, j) {
            self.inner.get(i, j)
        } else {
            T::zero()
        }
    }

    fn composite(&self) -> Cow<'_, M::Rows> {
        self.inner.composite()
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.inner.is_aliased(addr)
    }
}
