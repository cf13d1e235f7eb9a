//! Mutable rectangular views into dense targets.
//!
//! A `DenseBlockMut` covers a contiguous range of rows (row-major storage) or
//! columns (column-major storage) of a target matrix. Indices passed to it are
//! global, so kernels do not need to know how the target was partitioned.

use std::ops::Range;

use crate::core::scalar::Scalar;
use crate::core::traits::StorageOrder;

#[derive(Debug)]
pub struct DenseBlockMut<'a, T> {
    data: &'a mut [T],
    order: StorageOrder,
    spacing: usize,
    rows: Range<usize>,
    cols: Range<usize>,
}

impl<'a, T: Scalar> DenseBlockMut<'a, T> {
    /// `data` starts at `(rows.start, cols.start)`; `spacing` is the distance between
    /// consecutive rows (row-major) or columns (column-major).
    pub(crate) fn new(
        data: &'a mut [T],
        order: StorageOrder,
        spacing: usize,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Self {
        Self {
            data,
            order,
            spacing,
            rows,
            cols,
        }
    }

    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn cols(&self) -> Range<usize> {
        self.cols.clone()
    }

    pub fn order(&self) -> StorageOrder {
        self.order
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!(self.rows.contains(&i) && self.cols.contains(&j));
        match self.order {
            StorageOrder::RowMajor => (i - self.rows.start) * self.spacing + (j - self.cols.start),
            StorageOrder::ColumnMajor => {
                (j - self.cols.start) * self.spacing + (i - self.rows.start)
            }
        }
    }

    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[self.offset(i, j)]
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut T {
        let at = self.offset(i, j);
        &mut self.data[at]
    }

    /// Row `i` including its padding. Row-major blocks always span every column,
    /// so the slice is indexed by global column.
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        debug_assert_eq!(self.order, StorageOrder::RowMajor);
        debug_assert_eq!(self.cols.start, 0);
        let start = (i - self.rows.start) * self.spacing;
        &mut self.data[start..start + self.spacing]
    }

    /// Zero every element of the block.
    pub fn reset(&mut self) {
        self.data.iter_mut().for_each(|x| x.set_zero());
    }

    /// Split along the contiguous axis into at most `parts` disjoint blocks.
    pub fn split(self, parts: usize) -> Vec<DenseBlockMut<'a, T>> {
        let axis = match self.order {
            StorageOrder::RowMajor => self.rows.clone(),
            StorageOrder::ColumnMajor => self.cols.clone(),
        };
        let len = axis.len();
        if parts <= 1 || len <= 1 || self.spacing == 0 {
            return vec![self];
        }
        let chunk = len.div_ceil(parts);
        let Self {
            data,
            order,
            spacing,
            rows,
            cols,
        } = self;
        data.chunks_mut(chunk * spacing)
            .take(len.div_ceil(chunk))
            .enumerate()
            .map(|(k, piece)| {
                let start = axis.start + k * chunk;
                let end = (start + chunk).min(axis.end);
                match order {
                    StorageOrder::RowMajor => {
                        DenseBlockMut::new(piece, order, spacing, start..end, cols.clone())
                    }
                    StorageOrder::ColumnMajor => {
                        DenseBlockMut::new(piece, order, spacing, rows.clone(), start..end)
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_row_major_keeps_global_indices() {
        // 5x3 matrix, spacing 4
        let mut data: Vec<f64> = (0..20).map(|x| x as f64).collect();
        let block = DenseBlockMut::new(&mut data, StorageOrder::RowMajor, 4, 0..5, 0..3);
        let parts = block.split(2);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].rows(), 0..3);
        assert_eq!(parts[1].rows(), 3..5);
        assert_eq!(*parts[1].get(3, 1), 13.0);
        assert_eq!(*parts[1].get(4, 2), 18.0);
    }

    #[test]
    fn split_column_major_and_reset() {
        // 2x3 matrix stored by columns
        let mut data: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        {
            let block = DenseBlockMut::new(&mut data, StorageOrder::ColumnMajor, 2, 0..2, 0..3);
            let mut parts = block.split(3);
            assert_eq!(parts.len(), 3);
            assert_eq!(*parts[2].get(1, 2), 6.0);
            parts[1].reset();
        }
        assert_eq!(data, vec![1.0, 2.0, 0.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn split_degenerate_returns_whole_block() {
        let mut data: Vec<f64> = Vec::new();
        let block = DenseBlockMut::new(&mut data, StorageOrder::RowMajor, 0, 0..4, 0..0);
        assert_eq!(block.split(8).len(), 1);
    }
}
