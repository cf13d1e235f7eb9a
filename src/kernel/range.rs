//! Structural range computations.
//!
//! For a sparse nonzero `A(i, k)` (or a group of them) the range engine returns
//! the output columns of row `i` that can receive a nonzero contribution, given
//! the band of the dense operand and the declared structure of the result.

use std::ops::Range;

use crate::core::scalar::Scalar;
use crate::core::traits::Band;
use crate::expr::structure::Structure;
use crate::kernel::Update;
use crate::matrix::block::DenseBlockMut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEngine {
    band: Band,
    structure: Structure,
    update: Update,
}

impl RangeEngine {
    pub fn new(band: Band, structure: Structure, update: Update) -> Self {
        Self {
            band,
            structure,
            update,
        }
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    pub fn update(&self) -> Update {
        self.update
    }

    /// Columns left of the diagonal are never written.
    fn starts_at_diagonal(&self) -> bool {
        matches!(self.structure, Structure::Upper | Structure::Diagonal)
    }

    /// Columns right of the diagonal are never written. A symmetric result is
    /// only truncated for plain assignment, where the mirroring pass fills in
    /// the upper triangle.
    fn ends_at_diagonal(&self) -> bool {
        match self.update {
            Update::Assign => matches!(
                self.structure,
                Structure::Symmetric | Structure::Hermitian | Structure::Lower | Structure::Diagonal
            ),
            Update::Add | Update::Sub => {
                matches!(self.structure, Structure::Lower | Structure::Diagonal)
            }
        }
    }

    /// Output columns of row `i` touched by the nonzeros in columns `first..=last`
    /// of `A`, clipped to `block`. `None` when the range is empty.
    pub fn columns(
        &self,
        i: usize,
        first: usize,
        last: usize,
        block: &Range<usize>,
    ) -> Option<Range<usize>> {
        debug_assert!(first <= last);
        let mut begin = block.start;
        if self.band.is_upper() {
            begin = begin.max(if self.band.is_strictly_upper() {
                first + 1
            } else {
                first
            });
        }
        if self.starts_at_diagonal() {
            begin = begin.max(i);
        }

        let mut end = block.end;
        if self.band.is_lower() {
            end = end.min(if self.band.is_strictly_lower() {
                last
            } else {
                last + 1
            });
        }
        if self.ends_at_diagonal() {
            end = end.min(i + 1);
        }

        (begin < end).then_some(begin..end)
    }

    /// Whether cell `(i, k)` receives `A(i,k) * B(k,k)` for a diagonal dense operand.
    pub fn diagonal_cell(&self, i: usize, k: usize, block: &Range<usize>) -> bool {
        block.contains(&k)
            && !(self.starts_at_diagonal() && k < i)
            && !(self.ends_at_diagonal() && k > i)
    }
}

/// Span of the inner index `k` for which `A(i,k) * B(k,j)` can be nonzero.
pub fn element_span(
    band_a: Band,
    band_b: Band,
    i: usize,
    j: usize,
    inner: usize,
) -> Option<Range<usize>> {
    let mut begin = 0;
    let mut end = inner;
    if band_a.is_upper() {
        begin = if band_a.is_strictly_upper() { i + 1 } else { i };
    }
    if band_b.is_lower() {
        begin = begin.max(if band_b.is_strictly_lower() { j + 1 } else { j });
    }
    if band_a.is_lower() {
        end = end.min(if band_a.is_strictly_lower() { i } else { i + 1 });
    }
    if band_b.is_upper() {
        end = end.min(if band_b.is_strictly_upper() { j } else { j + 1 });
    }
    (begin < end).then_some(begin..end)
}

/// Fill the strict upper triangle from the lower one.
pub fn mirror<T: Scalar>(block: &mut DenseBlockMut<'_, T>, hermitian: bool) {
    debug_assert_eq!(block.rows(), block.cols());
    for i in block.rows() {
        for j in (i + 1)..block.cols().end {
            let v = block.get(j, i);
            let v = if hermitian { v.conj() } else { v.clone() };
            *block.get_mut(i, j) = v;
        }
    }
}
