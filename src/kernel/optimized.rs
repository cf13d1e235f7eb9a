//! Unrolled scalar kernel.
//!
//! Nonzeros of a sparse row are consumed four at a time; each group shares one
//! column range and the inner column loop is unrolled by four.

use crate::core::scalar::Scalar;
use crate::core::traits::{DenseRows, SparseRows};
use crate::kernel::chunks;
use crate::kernel::{KernelPlan, Update};
use crate::matrix::block::DenseBlockMut;

const UNROLL: usize = 4;

#[inline]
fn apply<T: Scalar>(c: &mut T, x: T, update: Update) {
    match update {
        Update::Assign | Update::Add => *c += x,
        Update::Sub => *c -= x,
    }
}

pub fn run<T, S, D>(block: &mut DenseBlockMut<'_, T>, a: &S, b: &D, plan: &KernelPlan)
where
    T: Scalar,
    S: SparseRows<T> + ?Sized,
    D: DenseRows<T> + ?Sized,
{
    let update = plan.range.update();
    if update == Update::Assign {
        block.reset();
    }
    let cols = block.cols();

    for i in block.rows() {
        let row = a.sparse_row(i);
        let groups = row.chunks_exact(UNROLL);
        let rest = groups.remainder();

        for group in groups {
            let [(i1, v1), (i2, v2), (i3, v3), (i4, v4)] = group else {
                continue;
            };
            debug_assert!(i1 < i2 && i2 < i3 && i3 < i4);
            let Some(range) = plan.range.columns(i, *i1, *i4, &cols) else {
                continue;
            };
            let (b1, b2, b3, b4) = (b.row(*i1), b.row(*i2), b.row(*i3), b.row(*i4));
            let term = |j: usize| {
                v1.clone() * b1[j].clone()
                    + v2.clone() * b2[j].clone()
                    + v3.clone() * b3[j].clone()
                    + v4.clone() * b4[j].clone()
            };

            let (body, tail) = chunks::split(range, UNROLL);
            for j in body {
                let (x0, x1, x2, x3) = (term(j), term(j + 1), term(j + 2), term(j + 3));
                apply(block.get_mut(i, j), x0, update);
                apply(block.get_mut(i, j + 1), x1, update);
                apply(block.get_mut(i, j + 2), x2, update);
                apply(block.get_mut(i, j + 3), x3, update);
            }
            for j in tail {
                apply(block.get_mut(i, j), term(j), update);
            }
        }

        for (k, v) in rest {
            let Some(range) = plan.range.columns(i, *k, *k, &cols) else {
                continue;
            };
            let brow = b.row(*k);
            let (body, tail) = chunks::split(range, UNROLL);
            for j in body {
                apply(block.get_mut(i, j), v.clone() * brow[j].clone(), update);
                apply(block.get_mut(i, j + 1), v.clone() * brow[j + 1].clone(), update);
                apply(block.get_mut(i, j + 2), v.clone() * brow[j + 2].clone(), update);
                apply(block.get_mut(i, j + 3), v.clone() * brow[j + 3].clone(), update);
            }
            for j in tail {
                apply(block.get_mut(i, j), v.clone() * brow[j].clone(), update);
            }
        }
    }
}
