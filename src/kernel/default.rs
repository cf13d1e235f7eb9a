//! Plain scalar kernel: one nonzero at a time, columns in blocks.

use crate::core::scalar::Scalar;
use crate::core::traits::{DenseRows, SparseRows};
use crate::kernel::{KernelPlan, Update};
use crate::matrix::block::DenseBlockMut;

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

    if plan.range.band().is_diagonal() {
        let cols = block.cols();
        for i in block.rows() {
            for (k, v) in a.sparse_row(i) {
                if !plan.range.diagonal_cell(i, *k, &cols) {
                    continue;
                }
                let x = v.clone() * b.row(*k)[*k].clone();
                let c = block.get_mut(i, *k);
                match update {
                    Update::Assign => *c = x,
                    Update::Add => *c += x,
                    Update::Sub => *c -= x,
                }
            }
        }
        return;
    }

    let cols = block.cols();
    let mut jj = cols.start;
    while jj < cols.end {
        let chunk = jj..jj.saturating_add(plan.block).min(cols.end);
        for i in block.rows() {
            for (k, v) in a.sparse_row(i) {
                let Some(range) = plan.range.columns(i, *k, *k, &chunk) else {
                    continue;
                };
                let brow = b.row(*k);
                for j in range {
                    let x = v.clone() * brow[j].clone();
                    let c = block.get_mut(i, j);
                    match update {
                        // first contribution overwrites the reset value
                        Update::Assign if c.is_default() => *c = x,
                        Update::Assign | Update::Add => *c += x,
                        Update::Sub => *c -= x,
                    }
                }
            }
        }
        jj = chunk.end;
    }
}
