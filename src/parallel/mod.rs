//! Shared-memory parallel execution of the multiplication kernels.
//!
//! The target is split into disjoint row blocks (row-major) or column blocks
//! (column-major), one per worker, and every block runs the planned kernel on
//! its own. Operands are only read, so no synchronization is needed.

#[cfg(feature = "rayon")]
pub mod rayon_pool;
#[cfg(feature = "rayon")]
pub use rayon_pool::RayonPool;

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "rayon")]
use tracing::debug_span;

#[cfg(feature = "rayon")]
use crate::core::scalar::Scalar;
#[cfg(feature = "rayon")]
use crate::core::traits::{DenseRows, SparseRows};
#[cfg(feature = "rayon")]
use crate::kernel::{self, KernelPlan};
#[cfg(feature = "rayon")]
use crate::matrix::block::DenseBlockMut;

/// Run `plan` over `block`, split across the pool's workers.
#[cfg(feature = "rayon")]
pub fn smp_run<T, S, D>(
    pool: Option<&RayonPool>,
    block: DenseBlockMut<'_, T>,
    a: &S,
    b: &D,
    plan: &KernelPlan,
) where
    T: Scalar,
    S: SparseRows<T> + ?Sized,
    D: DenseRows<T> + ?Sized,
{
    let threads = pool.map_or_else(rayon::current_num_threads, RayonPool::num_threads);
    let blocks = block.split(threads);
    debug_span!("smp_assign", blocks = blocks.len(), threads).in_scope(|| {
        let work = || {
            blocks
                .into_par_iter()
                .for_each(|mut part| kernel::run(&mut part, a, b, plan));
        };
        match pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    });
}
