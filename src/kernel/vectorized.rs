//! SIMD kernel for row-major targets.
//!
//! Groups of four nonzeros are broadcast into packed registers and combined
//! with `LANES` consecutive elements of the matching dense rows. When target
//! and dense operand are both padded and a range ends at the last column, the
//! final packed chunk runs into the zero padding instead of falling back to a
//! scalar loop. Non-finite values can leak into the padding that way, so it
//! is zeroed again afterwards.

use std::ops::Range;

use crate::core::scalar::{Packed, Scalar, lanes};
use crate::core::traits::{DenseRows, SparseRows};
use crate::kernel::chunks;
use crate::kernel::{KernelPlan, Update};
use crate::matrix::block::DenseBlockMut;

const GROUP: usize = 4;

#[inline]
fn splat<T: Scalar>(v: &T) -> T::Packed {
    <T::Packed as Packed<T>>::splat(v)
}

#[inline]
fn load<T: Scalar>(src: &[T]) -> T::Packed {
    <T::Packed as Packed<T>>::load(src)
}

#[inline]
fn combine<T: Scalar>(c: T::Packed, x: T::Packed, update: Update) -> T::Packed {
    match update {
        Update::Assign | Update::Add => c.add(x),
        Update::Sub => c.sub(x),
    }
}

#[inline]
fn apply<T: Scalar>(c: &mut T, x: T, update: Update) {
    match update {
        Update::Assign | Update::Add => *c += x,
        Update::Sub => *c -= x,
    }
}

/// End of the part of `range` handled with packed operations.
///
/// Widened to a whole number of chunks when padding may be overwritten and
/// every row slice (`lens`) is long enough; otherwise cut back to whole chunks.
fn packed_end(
    range: &Range<usize>,
    ncols: usize,
    remainder: bool,
    width: usize,
    lens: &[usize],
) -> usize {
    let widened = range.start + range.len().next_multiple_of(width);
    if !remainder && range.end == ncols && lens.iter().all(|&n| widened <= n) {
        widened
    } else {
        range.start + range.len() / width * width
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
    let ncols = cols.end;
    let width = lanes::<T>();

    for i in block.rows() {
        let row = a.sparse_row(i);
        let crow = block.row_mut(i);
        let groups = row.chunks_exact(GROUP);
        let rest = groups.remainder();
        let mut spilled = false;

        for group in groups {
            let [(i1, v1), (i2, v2), (i3, v3), (i4, v4)] = group else {
                continue;
            };
            debug_assert!(i1 < i2 && i2 < i3 && i3 < i4);
            let Some(range) = plan.range.columns(i, *i1, *i4, &cols) else {
                continue;
            };
            let (b1, b2, b3, b4) = (
                b.padded_row(*i1),
                b.padded_row(*i2),
                b.padded_row(*i3),
                b.padded_row(*i4),
            );
            let end = packed_end(
                &range,
                ncols,
                plan.remainder,
                width,
                &[crow.len(), b1.len(), b2.len(), b3.len(), b4.len()],
            );

            spilled |= end > range.end;

            let (a1, a2, a3, a4) = (splat(v1), splat(v2), splat(v3), splat(v4));
            let (body, _) = chunks::split(range.start..end, width);
            for j in body {
                let x = a1
                    .clone()
                    .mul(load(&b1[j..]))
                    .add(a2.clone().mul(load(&b2[j..])))
                    .add(a3.clone().mul(load(&b3[j..])))
                    .add(a4.clone().mul(load(&b4[j..])));
                combine::<T>(load(&crow[j..]), x, update).store(&mut crow[j..]);
            }
            for j in end.min(range.end)..range.end {
                let x = v1.clone() * b1[j].clone()
                    + v2.clone() * b2[j].clone()
                    + v3.clone() * b3[j].clone()
                    + v4.clone() * b4[j].clone();
                apply(&mut crow[j], x, update);
            }
        }

        for (k, v) in rest {
            let Some(range) = plan.range.columns(i, *k, *k, &cols) else {
                continue;
            };
            let b1 = b.padded_row(*k);
            let end = packed_end(&range, ncols, plan.remainder, width, &[crow.len(), b1.len()]);
            spilled |= end > range.end;
            let a1 = splat(v);
            let (body, _) = chunks::split(range.start..end, width);
            for j in body {
                let x = a1.clone().mul(load(&b1[j..]));
                combine::<T>(load(&crow[j..]), x, update).store(&mut crow[j..]);
            }
            for j in end.min(range.end)..range.end {
                apply(&mut crow[j], v.clone() * b1[j].clone(), update);
            }
        }

        if spilled {
            crow[ncols..].iter_mut().for_each(T::set_zero);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_end_widens_only_into_padding() {
        // 6 columns, 4 lanes, rows padded to 8
        assert_eq!(packed_end(&(3..6), 6, false, 4, &[8, 8]), 7);
        assert_eq!(packed_end(&(3..6), 6, true, 4, &[8, 8]), 3);
        assert_eq!(packed_end(&(1..5), 6, false, 4, &[8, 8]), 5);
        // not enough padding behind an unaligned start
        assert_eq!(packed_end(&(1..8), 8, false, 4, &[8, 8]), 5);
        assert_eq!(packed_end(&(0..8), 8, false, 4, &[8, 8]), 8);
    }
}
