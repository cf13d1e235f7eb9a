//! The lazy sparse-dense product and its construction.
//!
//! `multiply` validates the inner dimensions and picks one of three results:
//! a forwarded reference to the dense operand when the sparse operand is an
//! identity, an all-zero result when it is a zero matrix, and otherwise a lazy
//! `SparseDenseProduct` that is only computed when assigned to a target.

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::context::MultContext;
use crate::core::scalar::Scalar;
use crate::core::traits::{Band, DenseOperand, DenseRows, MatShape, SparseKind, SparseOperand};
use crate::error::MatError;
use crate::expr::structure::{DeclFlags, Structure};
use crate::kernel::Update;
use crate::kernel::range::element_span;
use crate::matrix::dense::RowMajorMatrix;

/// Unevaluated `A * B` with `A` sparse row-major and `B` dense row-major.
///
/// The node only borrows its operands. Every assignment recomputes the product.
pub struct SparseDenseProduct<'a, T, A: ?Sized, B: ?Sized> {
    lhs: &'a A,
    rhs: &'a B,
    flags: DeclFlags,
    structure: Structure,
    _elem: PhantomData<fn() -> T>,
}

impl<T, A: ?Sized, B: ?Sized> Clone for SparseDenseProduct<'_, T, A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: ?Sized, B: ?Sized> Copy for SparseDenseProduct<'_, T, A, B> {}

impl<'a, T, A, B> SparseDenseProduct<'a, T, A, B>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    /// Lazy product without fast paths.
    pub fn new(lhs: &'a A, rhs: &'a B) -> Result<Self, MatError> {
        check_inner(lhs, rhs)?;
        Ok(Self::from_checked(lhs, rhs))
    }

    fn from_checked(lhs: &'a A, rhs: &'a B) -> Self {
        Self {
            lhs,
            rhs,
            flags: DeclFlags::empty(),
            structure: Structure::General,
            _elem: PhantomData,
        }
    }

    pub fn left_operand(&self) -> &'a A {
        self.lhs
    }

    pub fn right_operand(&self) -> &'a B {
        self.rhs
    }

    pub fn flags(&self) -> DeclFlags {
        self.flags
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    fn declare(mut self, flag: DeclFlags, what: &'static str) -> Result<Self, MatError> {
        if !self.is_square() {
            return Err(MatError::InvalidDeclaration(what));
        }
        self.flags |= flag;
        self.structure = Structure::from_flags(self.flags);
        Ok(self)
    }

    pub fn declare_symmetric(self) -> Result<Self, MatError> {
        self.declare(DeclFlags::SYMMETRIC, "symmetric")
    }

    pub fn declare_hermitian(self) -> Result<Self, MatError> {
        self.declare(DeclFlags::HERMITIAN, "Hermitian")
    }

    pub fn declare_lower(self) -> Result<Self, MatError> {
        self.declare(DeclFlags::LOWER, "lower")
    }

    pub fn declare_upper(self) -> Result<Self, MatError> {
        self.declare(DeclFlags::UPPER, "upper")
    }

    pub fn declare_diagonal(self) -> Result<Self, MatError> {
        self.declare(DeclFlags::DIAGONAL, "diagonal")
    }

    /// Element `(i, j)` of the declared result.
    pub fn get(&self, i: usize, j: usize) -> T {
        match self.structure {
            Structure::Lower if j > i => T::zero(),
            Structure::Upper if j < i => T::zero(),
            Structure::Diagonal if i != j => T::zero(),
            Structure::Symmetric if j > i => self.element(j, i),
            Structure::Hermitian if j > i => self.element(j, i).conj(),
            _ => self.element(i, j),
        }
    }

    /// Checked element access.
    pub fn at(&self, i: usize, j: usize) -> Result<T, MatError> {
        if i >= self.nrows() {
            return Err(MatError::OutOfRange {
                axis: "row",
                index: i,
                extent: self.nrows(),
            });
        }
        if j >= self.ncols() {
            return Err(MatError::OutOfRange {
                axis: "column",
                index: j,
                extent: self.ncols(),
            });
        }
        Ok(self.get(i, j))
    }

    /// Raw `sum_k A(i,k) * B(k,j)` restricted to the structurally nonzero span.
    fn element(&self, i: usize, j: usize) -> T {
        let (band_a, band_b) = (self.lhs.band(), self.rhs.band());
        if band_a.is_diagonal() {
            return self.lhs.get(i, i) * self.rhs.get(i, j);
        }
        if band_b.is_diagonal() {
            return self.lhs.get(i, j) * self.rhs.get(j, j);
        }
        let Some(span) = element_span(band_a, band_b, i, j, self.lhs.ncols()) else {
            return T::zero();
        };
        let row = self.lhs.row_entries(i);
        let lo = row.partition_point(|(k, _)| *k < span.start);
        let hi = row.partition_point(|(k, _)| *k < span.end);
        let mut terms = row[lo..hi]
            .iter()
            .map(|(k, v)| v.clone() * self.rhs.get(*k, j));
        match terms.next() {
            Some(first) => terms.fold(first, |mut acc, t| {
                acc += t;
                acc
            }),
            None => T::zero(),
        }
    }

    /// Whether either operand's storage contains `addr`.
    pub fn can_alias(&self, addr: *const ()) -> bool {
        self.lhs.is_aliased(addr) || self.rhs.is_aliased(addr)
    }

    /// Like `can_alias`, ignoring operands that are copied into temporaries first.
    pub fn is_aliased(&self, addr: *const ()) -> bool {
        (!A::EVALUATE && self.lhs.is_aliased(addr)) || (!B::EVALUATE && self.rhs.is_aliased(addr))
    }

    /// Large enough for the parallel path, and not a diagonal dense operand.
    pub fn can_run_in_parallel(&self, threshold: usize) -> bool {
        self.nrows() * self.ncols() >= threshold && !self.rhs.band().is_diagonal()
    }

    /// Serial evaluation into a new row-major matrix.
    pub fn evaluate(&self) -> RowMajorMatrix<T> {
        let mut out = RowMajorMatrix::zeros(self.nrows(), self.ncols());
        MultContext::serial().assign_lazy(&mut out, *self, Update::Assign);
        out
    }
}

impl<T, A: MatShape + ?Sized, B: MatShape + ?Sized> MatShape for SparseDenseProduct<'_, T, A, B> {
    fn nrows(&self) -> usize {
        self.lhs.nrows()
    }
    fn ncols(&self) -> usize {
        self.rhs.ncols()
    }
}

impl<T, A, B> DenseOperand<T> for SparseDenseProduct<'_, T, A, B>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    const EVALUATE: bool = true;

    type Rows = RowMajorMatrix<T>;

    fn band(&self) -> Band {
        self.structure.band()
    }

    fn get(&self, i: usize, j: usize) -> T {
        SparseDenseProduct::get(self, i, j)
    }

    fn composite(&self) -> Cow<'_, RowMajorMatrix<T>> {
        Cow::Owned(self.evaluate())
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.can_alias(addr)
    }
}

/// Result of `multiply`.
pub enum Product<'a, T, A: ?Sized, B: ?Sized> {
    /// General product, evaluated on assignment.
    Lazy(SparseDenseProduct<'a, T, A, B>),
    /// `I * B`: the dense operand itself.
    Forward { identity: &'a A, operand: &'a B },
    /// `0 * B`.
    Zero { nrows: usize, ncols: usize },
}

impl<T, A: ?Sized, B: ?Sized> Clone for Product<'_, T, A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: ?Sized, B: ?Sized> Copy for Product<'_, T, A, B> {}

fn check_inner<T, A, B>(lhs: &A, rhs: &B) -> Result<(), MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    if lhs.ncols() != rhs.nrows() {
        return Err(MatError::mismatch(
            "sparse-dense multiplication",
            lhs.shape(),
            rhs.shape(),
        ));
    }
    Ok(())
}

/// `lhs * rhs`, with the identity and zero fast paths applied.
pub fn multiply<'a, T, A, B>(lhs: &'a A, rhs: &'a B) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    check_inner(lhs, rhs)?;
    Ok(match A::KIND {
        SparseKind::Identity => Product::Forward {
            identity: lhs,
            operand: rhs,
        },
        SparseKind::Zero => Product::Zero {
            nrows: lhs.nrows(),
            ncols: rhs.ncols(),
        },
        SparseKind::General => Product::Lazy(SparseDenseProduct::from_checked(lhs, rhs)),
    })
}

impl<'a, T, A, B> Product<'a, T, A, B>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    /// The lazy node, if the product was not short-circuited.
    pub fn as_lazy(&self) -> Option<&SparseDenseProduct<'a, T, A, B>> {
        match self {
            Product::Lazy(p) => Some(p),
            _ => None,
        }
    }

    /// The lazy node; forwarded products are turned back into one.
    pub fn into_lazy(self) -> Option<SparseDenseProduct<'a, T, A, B>> {
        match self {
            Product::Lazy(p) => Some(p),
            Product::Forward { identity, operand } => {
                Some(SparseDenseProduct::from_checked(identity, operand))
            }
            Product::Zero { .. } => None,
        }
    }

    pub fn structure(&self) -> Structure {
        match self {
            Product::Lazy(p) => p.structure(),
            _ => Structure::General,
        }
    }

    /// A declaration on a forwarded product falls back to the lazy node so the
    /// declared structure is honored; a zero result satisfies every declaration.
    fn declare(
        self,
        what: &'static str,
        apply: fn(
            SparseDenseProduct<'a, T, A, B>,
        ) -> Result<SparseDenseProduct<'a, T, A, B>, MatError>,
    ) -> Result<Self, MatError> {
        match self {
            Product::Zero { nrows, ncols } if nrows != ncols => {
                Err(MatError::InvalidDeclaration(what))
            }
            Product::Zero { .. } => Ok(self),
            other => match other.into_lazy() {
                Some(p) => apply(p).map(Product::Lazy),
                None => Ok(other),
            },
        }
    }

    pub fn declare_symmetric(self) -> Result<Self, MatError> {
        self.declare("symmetric", SparseDenseProduct::declare_symmetric)
    }

    pub fn declare_hermitian(self) -> Result<Self, MatError> {
        self.declare("Hermitian", SparseDenseProduct::declare_hermitian)
    }

    pub fn declare_lower(self) -> Result<Self, MatError> {
        self.declare("lower", SparseDenseProduct::declare_lower)
    }

    pub fn declare_upper(self) -> Result<Self, MatError> {
        self.declare("upper", SparseDenseProduct::declare_upper)
    }

    pub fn declare_diagonal(self) -> Result<Self, MatError> {
        self.declare("diagonal", SparseDenseProduct::declare_diagonal)
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        match self {
            Product::Lazy(p) => p.get(i, j),
            Product::Forward { operand, .. } => operand.get(i, j),
            Product::Zero { .. } => T::zero(),
        }
    }

    pub fn can_alias(&self, addr: *const ()) -> bool {
        match self {
            Product::Lazy(p) => p.can_alias(addr),
            Product::Forward { operand, .. } => operand.is_aliased(addr),
            Product::Zero { .. } => false,
        }
    }

    pub fn is_aliased(&self, addr: *const ()) -> bool {
        match self {
            Product::Lazy(p) => p.is_aliased(addr),
            Product::Forward { operand, .. } => !B::EVALUATE && operand.is_aliased(addr),
            Product::Zero { .. } => false,
        }
    }

    /// Serial evaluation into a new row-major matrix.
    pub fn evaluate(&self) -> RowMajorMatrix<T> {
        match self {
            Product::Lazy(p) => p.evaluate(),
            Product::Forward { operand, .. } => {
                let rows = operand.composite();
                RowMajorMatrix::from_fn(rows.nrows(), rows.ncols(), |i, j| rows.row(i)[j].clone())
            }
            Product::Zero { nrows, ncols } => RowMajorMatrix::zeros(*nrows, *ncols),
        }
    }
}

impl<T, A: MatShape + ?Sized, B: MatShape + ?Sized> MatShape for Product<'_, T, A, B> {
    fn nrows(&self) -> usize {
        match self {
            Product::Lazy(p) => p.nrows(),
            Product::Forward { operand, .. } => operand.nrows(),
            Product::Zero { nrows, .. } => *nrows,
        }
    }
    fn ncols(&self) -> usize {
        match self {
            Product::Lazy(p) => p.ncols(),
            Product::Forward { operand, .. } => operand.ncols(),
            Product::Zero { ncols, .. } => *ncols,
        }
    }
}

/// Products nest: the inner product is evaluated into a temporary first.
impl<T, A, B> DenseOperand<T> for Product<'_, T, A, B>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    const EVALUATE: bool = true;

    type Rows = RowMajorMatrix<T>;

    fn band(&self) -> Band {
        match self {
            Product::Lazy(p) => p.structure().band(),
            Product::Forward { operand, .. } => operand.band(),
            Product::Zero { .. } => Band::General,
        }
    }

    fn get(&self, i: usize, j: usize) -> T {
        Product::get(self, i, j)
    }

    fn composite(&self) -> Cow<'_, RowMajorMatrix<T>> {
        Cow::Owned(self.evaluate())
    }

    fn is_aliased(&self, addr: *const ()) -> bool {
        self.can_alias(addr)
    }
}

pub fn decl_sym<'a, T, A, B>(p: Product<'a, T, A, B>) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    p.declare_symmetric()
}

pub fn decl_herm<'a, T, A, B>(p: Product<'a, T, A, B>) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    p.declare_hermitian()
}

pub fn decl_low<'a, T, A, B>(p: Product<'a, T, A, B>) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    p.declare_lower()
}

pub fn decl_upp<'a, T, A, B>(p: Product<'a, T, A, B>) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    p.declare_upper()
}

pub fn decl_diag<'a, T, A, B>(p: Product<'a, T, A, B>) -> Result<Product<'a, T, A, B>, MatError>
where
    T: Scalar,
    A: SparseOperand<T> + ?Sized,
    B: DenseOperand<T> + ?Sized,
{
    p.declare_diagonal()
}
