//! Assignment dispatcher for sparse-dense products.
//!
//! `MultContext` owns the multiplication options (and, with the `rayon` feature,
//! an optional dedicated thread pool) and decides how a product reaches its
//! target:
//!
//! 1. the target shape is checked before anything is written;
//! 2. short-circuited products (identity, zero) are applied element-wise;
//! 3. Schur-product assignment evaluates the product into a temporary first;
//! 4. otherwise operands that are expressions are materialized, the kernel tier
//!    is selected and the kernel runs serially or across the thread pool.
//!
//! Sparse targets receive the result through a dense temporary.
//!
//! # Example
//! ```rust,ignore
//! use spdmm::{CsrMatrix, MultContext, RowMajorMatrix, multiply};
//! let ctx = MultContext::default();
//! let mut c = RowMajorMatrix::zeros(a.nrows(), b.ncols());
//! ctx.assign(&mut c, multiply(&a, &b)?)?;
//! ```

use tracing::{debug, instrument, trace};

use crate::config::MultOptions;
use crate::core::probe::Capabilities;
use crate::core::scalar::Scalar;
use crate::core::traits::{
    DenseOperand, DenseRows, DenseTarget, MatShape, SparseOperand, SparseRows,
};
use crate::error::MatError;
use crate::expr::product::{Product, SparseDenseProduct};
use crate::kernel::{self, AssignOp, KernelChoice, KernelPlan, KernelTier, Update, select_kernel};
use crate::matrix::block::DenseBlockMut;
use crate::matrix::dense::{ColMajorMatrix, RowMajorMatrix};
use crate::matrix::sparse::CsrMatrix;
#[cfg(feature = "rayon")]
use crate::parallel::{self, RayonPool};

/// Options plus execution resources for evaluating products.
#[derive(Debug)]
pub struct MultContext {
    options: MultOptions,
    #[cfg(feature = "rayon")]
    pool: Option<RayonPool>,
}

impl Default for MultContext {
    fn default() -> Self {
        Self {
            options: MultOptions::default(),
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }
}

impl MultContext {
    /// Build a context with a dedicated pool of `options.threads` workers, one per
    /// logical CPU when unset. [`MultContext::default`] uses the global rayon pool.
    pub fn new(options: MultOptions) -> Result<Self, MatError> {
        #[cfg(feature = "rayon")]
        let pool = match options.threads {
            _ if !options.smp_enabled() => None,
            Some(n) => Some(RayonPool::new(n)?),
            None => Some(RayonPool::with_available_cpus()?),
        };
        Ok(Self {
            options,
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Context that never leaves the calling thread.
    pub fn serial() -> Self {
        Self {
            options: MultOptions::serial(),
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    pub fn options(&self) -> &MultOptions {
        &self.options
    }

    /// Apply `target op= product`.
    #[instrument(
        level = "debug",
        skip_all,
        fields(op = ?op, rows = product.nrows(), cols = product.ncols())
    )]
    pub fn evaluate_into<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
        op: AssignOp,
    ) -> Result<(), MatError>
    where
        T: Scalar,
        C: Target<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        if target.shape() != product.shape() {
            return Err(MatError::mismatch(
                "product assignment",
                target.shape(),
                product.shape(),
            ));
        }
        target.accept(self, product, op);
        Ok(())
    }

    /// `target = product`
    pub fn assign<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
    ) -> Result<(), MatError>
    where
        T: Scalar,
        C: Target<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        self.evaluate_into(target, product, AssignOp::Assign)
    }

    /// `target += product`
    pub fn add_assign<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
    ) -> Result<(), MatError>
    where
        T: Scalar,
        C: Target<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        self.evaluate_into(target, product, AssignOp::AddAssign)
    }

    /// `target -= product`
    pub fn sub_assign<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
    ) -> Result<(), MatError>
    where
        T: Scalar,
        C: Target<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        self.evaluate_into(target, product, AssignOp::SubAssign)
    }

    /// Element-wise `target *= product`
    pub fn schur_assign<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
    ) -> Result<(), MatError>
    where
        T: Scalar,
        C: Target<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        self.evaluate_into(target, product, AssignOp::SchurAssign)
    }

    /// Evaluate into a new dense matrix.
    pub fn evaluate<T, A, B>(&self, product: Product<'_, T, A, B>) -> RowMajorMatrix<T>
    where
        T: Scalar,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        let mut out = RowMajorMatrix::zeros(product.nrows(), product.ncols());
        self.dense_assign(&mut out, product, AssignOp::Assign);
        out
    }

    /// Evaluate into a new sparse matrix, dropping zeros.
    pub fn evaluate_sparse<T, A, B>(&self, product: Product<'_, T, A, B>) -> CsrMatrix<T>
    where
        T: Scalar,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        CsrMatrix::from_dense(&self.evaluate(product))
    }

    /// Dense-target path; shapes are already known to match.
    pub(crate) fn dense_assign<T, C, A, B>(
        &self,
        target: &mut C,
        product: Product<'_, T, A, B>,
        op: AssignOp,
    ) where
        T: Scalar,
        C: DenseTarget<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        match product {
            Product::Zero { .. } => {
                if matches!(op, AssignOp::Assign | AssignOp::SchurAssign) {
                    target.block_mut().reset();
                }
            }
            Product::Forward { operand, .. } => {
                if B::EVALUATE {
                    trace!("forwarded operand evaluated into a temporary");
                }
                let rows = operand.composite();
                elementwise(&mut target.block_mut(), &*rows, op);
            }
            Product::Lazy(p) => {
                let caps = Capabilities::probe::<T, C, A, B>(&self.options, p.right_operand());
                match kernel::route(&caps, op) {
                    KernelChoice::Direct { tier, update } => {
                        self.run_lazy(target, p, &caps, tier, update)
                    }
                    KernelChoice::ViaTemporary => {
                        trace!("schur assignment through a dense temporary");
                        let tmp = p.evaluate();
                        elementwise(&mut target.block_mut(), &tmp, op);
                    }
                }
            }
        }
    }

    /// Run the kernels for a lazy product.
    pub(crate) fn assign_lazy<T, C, A, B>(
        &self,
        target: &mut C,
        product: SparseDenseProduct<'_, T, A, B>,
        update: Update,
    ) where
        T: Scalar,
        C: DenseTarget<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        let caps = Capabilities::probe::<T, C, A, B>(&self.options, product.right_operand());
        let tier = select_kernel(&caps);
        self.run_lazy(target, product, &caps, tier, update);
    }

    fn run_lazy<T, C, A, B>(
        &self,
        target: &mut C,
        product: SparseDenseProduct<'_, T, A, B>,
        caps: &Capabilities,
        tier: KernelTier,
        update: Update,
    ) where
        T: Scalar,
        C: DenseTarget<T> + ?Sized,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        debug_assert!(!product.is_aliased(target.data_ptr()));
        if caps.evaluate_left {
            trace!("sparse operand evaluated into a temporary");
        }
        let a = product.left_operand().composite();
        if caps.evaluate_right {
            trace!("dense operand evaluated into a temporary");
        }
        let b = product.right_operand().composite();

        let plan = KernelPlan::new(tier, caps, product.structure(), update, &self.options);
        let parallel = self.use_parallel(&product);
        self.run_blocks(target.block_mut(), &*a, &*b, &plan, parallel);
    }

    fn use_parallel<T, A, B>(&self, product: &SparseDenseProduct<'_, T, A, B>) -> bool
    where
        T: Scalar,
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        if !self.options.smp_enabled()
            || !product.can_run_in_parallel(self.options.smp_threshold)
        {
            return false;
        }
        let structure = product.structure();
        if structure.is_structured() {
            debug!(structure = structure.name(), "structured product runs serially");
            return false;
        }
        debug!(threshold = self.options.smp_threshold, "parallel assignment");
        true
    }

    #[cfg(feature = "rayon")]
    fn run_blocks<T, S, D>(
        &self,
        block: DenseBlockMut<'_, T>,
        a: &S,
        b: &D,
        plan: &KernelPlan,
        parallel: bool,
    ) where
        T: Scalar,
        S: SparseRows<T> + ?Sized,
        D: DenseRows<T> + ?Sized,
    {
        if parallel {
            parallel::smp_run(self.pool.as_ref(), block, a, b, plan);
        } else {
            let mut block = block;
            kernel::run(&mut block, a, b, plan);
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn run_blocks<T, S, D>(
        &self,
        block: DenseBlockMut<'_, T>,
        a: &S,
        b: &D,
        plan: &KernelPlan,
        _parallel: bool,
    ) where
        T: Scalar,
        S: SparseRows<T> + ?Sized,
        D: DenseRows<T> + ?Sized,
    {
        let mut block = block;
        kernel::run(&mut block, a, b, plan);
    }
}

/// `block op= rows`, element by element.
fn elementwise<T, R>(block: &mut DenseBlockMut<'_, T>, rows: &R, op: AssignOp)
where
    T: Scalar,
    R: DenseRows<T> + ?Sized,
{
    for i in block.rows() {
        let src = rows.row(i);
        for j in block.cols() {
            let x = src[j].clone();
            let c = block.get_mut(i, j);
            match op {
                AssignOp::Assign => *c = x,
                AssignOp::AddAssign => *c += x,
                AssignOp::SubAssign => *c -= x,
                AssignOp::SchurAssign => *c *= x,
            }
        }
    }
}

/// A matrix a product can be assigned to.
pub trait Target<T: Scalar>: MatShape {
    fn accept<A, B>(&mut self, ctx: &MultContext, product: Product<'_, T, A, B>, op: AssignOp)
    where
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized;
}

impl<T: Scalar> Target<T> for RowMajorMatrix<T> {
    fn accept<A, B>(&mut self, ctx: &MultContext, product: Product<'_, T, A, B>, op: AssignOp)
    where
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        ctx.dense_assign(self, product, op);
    }
}

impl<T: Scalar> Target<T> for ColMajorMatrix<T> {
    fn accept<A, B>(&mut self, ctx: &MultContext, product: Product<'_, T, A, B>, op: AssignOp)
    where
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        ctx.dense_assign(self, product, op);
    }
}

impl<T: Scalar> Target<T> for CsrMatrix<T> {
    fn accept<A, B>(&mut self, ctx: &MultContext, product: Product<'_, T, A, B>, op: AssignOp)
    where
        A: SparseOperand<T> + ?Sized,
        B: DenseOperand<T> + ?Sized,
    {
        trace!("sparse target assigned through a dense temporary");
        let mut tmp = match op {
            AssignOp::Assign => RowMajorMatrix::zeros(self.nrows(), self.ncols()),
            _ => self.to_dense(),
        };
        ctx.dense_assign(&mut tmp, product, op);
        *self = CsrMatrix::from_dense(&tmp);
    }
}
