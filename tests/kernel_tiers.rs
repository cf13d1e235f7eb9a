//! Tests for the three kernel tiers: vectorized, unrolled and default.
//!
//! Each tier is forced through the target type or the options and compared to
//! the reference triple loop and to faer's dense product, on random operands
//! with empty rows, fully dense rows and widths around the SIMD lane count.

use approx::assert_relative_eq;
use num_bigint::BigInt;
use num_complex::Complex;
use rand::Rng;
use spdmm::{
    ColMajorMatrix, CsrMatrix, DenseRows, DenseView, MatShape, MultContext, MultOptions,
    RowMajorMatrix, multiply, reference_product,
};

fn random_csr(rng: &mut impl Rng, nrows: usize, ncols: usize, density: f64) -> CsrMatrix<f64> {
    let mut rows = Vec::with_capacity(nrows);
    for i in 0..nrows {
        let mut row = Vec::new();
        for j in 0..ncols {
            let keep = match i % 5 {
                0 => false,
                1 => true,
                _ => rng.r#gen::<f64>() < density,
            };
            if keep {
                row.push((j, rng.r#gen::<f64>() - 0.5));
            }
        }
        rows.push(row);
    }
    CsrMatrix::from_rows(ncols, rows).unwrap()
}

fn random_dense(rng: &mut impl Rng, nrows: usize, ncols: usize) -> RowMajorMatrix<f64> {
    RowMajorMatrix::from_fn(nrows, ncols, |_, _| rng.r#gen::<f64>() - 0.5)
}

fn assert_close(c: &RowMajorMatrix<f64>, expected: &RowMajorMatrix<f64>) {
    assert_eq!((c.nrows(), c.ncols()), (expected.nrows(), expected.ncols()));
    for i in 0..c.nrows() {
        for j in 0..c.ncols() {
            assert_relative_eq!(
                c[(i, j)],
                expected[(i, j)],
                epsilon = 1e-12,
                max_relative = 1e-10
            );
        }
    }
}

fn serial(optimized: bool) -> MultContext {
    MultContext::new(MultOptions::serial().with_optimized_kernels(optimized)).unwrap()
}

/// All tiers agree with the reference and with faer on random products.
#[test]
fn tiers_agree_on_random_products() {
    let mut rng = rand::thread_rng();
    for &(m, k, n) in &[(7, 5, 3), (13, 11, 9), (20, 17, 16), (33, 8, 5), (6, 12, 1)] {
        let a = random_csr(&mut rng, m, k, 0.4);
        let b = random_dense(&mut rng, k, n);
        let reference = reference_product(&a, &b).unwrap();

        // vectorized: padded row-major target
        let mut vec_c = RowMajorMatrix::zeros(m, n);
        serial(true).assign(&mut vec_c, multiply(&a, &b).unwrap()).unwrap();
        assert_close(&vec_c, &reference);

        // optimized: column-major target rules out SIMD
        let mut opt_c = ColMajorMatrix::zeros(m, n);
        serial(true).assign(&mut opt_c, multiply(&a, &b).unwrap()).unwrap();
        assert_close(&opt_c.to_row_major(), &reference);

        // default
        let mut def_c = RowMajorMatrix::zeros(m, n);
        serial(false).assign(&mut def_c, multiply(&a, &b).unwrap()).unwrap();
        assert_close(&def_c, &reference);

        let faer_c = &a.to_dense().to_faer() * &b.to_faer();
        assert_close(&vec_c, &RowMajorMatrix::from_faer(&faer_c));
    }
}

/// An unpadded dense operand forces the scalar remainder loop of the SIMD kernel.
#[test]
fn unpadded_dense_operand() {
    let mut rng = rand::thread_rng();
    let (m, k, n) = (9, 7, 11);
    let a = random_csr(&mut rng, m, k, 0.5);
    let data: Vec<f64> = (0..k * n).map(|_| rng.r#gen::<f64>()).collect();
    let b = DenseView::new(&data, k, n).unwrap();
    let mut c = RowMajorMatrix::zeros(m, n);
    serial(true).assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
    assert_close(&c, &reference_product(&a, &b).unwrap());
}

/// Eight-lane single precision kernel.
#[test]
fn single_precision_vectorized() {
    let a = CsrMatrix::from_rows(
        10,
        vec![
            (0..10).map(|j| (j, 1.0f32 + j as f32)).collect(),
            vec![(1, 0.5), (3, -2.0), (4, 1.0), (8, 3.0), (9, 1.0)],
            vec![],
        ],
    )
    .unwrap();
    let b = RowMajorMatrix::from_fn(10, 13, |i, j| (i as f32) - 0.25 * (j as f32));
    let mut c = RowMajorMatrix::zeros(3, 13);
    serial(true).assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
    let reference = reference_product(&a, &b).unwrap();
    for i in 0..3 {
        for j in 0..13 {
            assert_relative_eq!(c[(i, j)], reference[(i, j)], epsilon = 1e-3, max_relative = 1e-5);
        }
    }
}

/// `C = AB; C += AB; C -= AB; C -= AB` ends at the first result minus `AB`, on every tier.
#[test]
fn accumulation_cancels_on_every_tier() {
    let mut rng = rand::thread_rng();
    let a = random_csr(&mut rng, 12, 9, 0.5);
    let b = random_dense(&mut rng, 9, 7);
    let ab = reference_product(&a, &b).unwrap();

    for optimized in [true, false] {
        let ctx = serial(optimized);
        let mut c = RowMajorMatrix::zeros(12, 7);
        ctx.assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
        let first = c.clone();
        ctx.add_assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
        ctx.sub_assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
        ctx.sub_assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
        for i in 0..12 {
            for j in 0..7 {
                assert_relative_eq!(c[(i, j)] - first[(i, j)], -ab[(i, j)], epsilon = 1e-12);
                assert_relative_eq!(c[(i, j)], 0.0, epsilon = 1e-12);
            }
        }

        let mut cm = ColMajorMatrix::zeros(12, 7);
        ctx.assign(&mut cm, multiply(&a, &b).unwrap()).unwrap();
        ctx.sub_assign(&mut cm, multiply(&a, &b).unwrap()).unwrap();
        ctx.sub_assign(&mut cm, multiply(&a, &b).unwrap()).unwrap();
        let cm = cm.to_row_major();
        for i in 0..12 {
            for j in 0..7 {
                assert_relative_eq!(cm[(i, j)], -ab[(i, j)], epsilon = 1e-12);
            }
        }
    }
}

/// Column blocking of the default kernel on column-major targets.
#[test]
fn column_blocks_cover_every_column() {
    let mut rng = rand::thread_rng();
    let a = random_csr(&mut rng, 8, 6, 0.6);
    let b = random_dense(&mut rng, 6, 10);
    let ctx = MultContext::new(
        MultOptions::serial()
            .with_optimized_kernels(false)
            .with_column_block(3),
    )
    .unwrap();
    let mut c = ColMajorMatrix::zeros(8, 10);
    ctx.assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
    assert_close(&c.to_row_major(), &reference_product(&a, &b).unwrap());
}

/// Exact element types go through the scalar tiers.
#[test]
fn integer_and_complex_elements() {
    let a = CsrMatrix::from_rows(
        3,
        vec![
            vec![(0, 2i64), (1, -1), (2, 3)],
            vec![(1, 4)],
            vec![(0, 1), (1, 1), (2, 1)],
            vec![(0, 5), (2, 7)],
        ],
    )
    .unwrap();
    let b = RowMajorMatrix::from_fn(3, 6, |i, j| (i * 6 + j) as i64 - 4);
    let expected = reference_product(&a, &b).unwrap();
    for optimized in [true, false] {
        let mut c = RowMajorMatrix::zeros(4, 6);
        serial(optimized).assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
        assert_eq!(c, expected);
    }

    let big_a = CsrMatrix::from_rows(
        2,
        vec![vec![(0, BigInt::from(3)), (1, BigInt::from(-2))], vec![(1, BigInt::from(10))]],
    )
    .unwrap();
    let big_b = RowMajorMatrix::from_fn(2, 2, |i, j| {
        BigInt::from(1u64 << 40) * BigInt::from(i + j + 1)
    });
    let mut big_c = RowMajorMatrix::zeros(2, 2);
    serial(true).assign(&mut big_c, multiply(&big_a, &big_b).unwrap()).unwrap();
    assert_eq!(big_c, reference_product(&big_a, &big_b).unwrap());

    let ca = CsrMatrix::from_rows(
        2,
        vec![vec![(0, Complex::new(1.0, 1.0)), (1, Complex::new(0.0, -2.0))], vec![]],
    )
    .unwrap();
    let cb = RowMajorMatrix::from_fn(2, 5, |i, j| Complex::new(i as f64, j as f64));
    let mut cc = RowMajorMatrix::zeros(2, 5);
    serial(true).assign(&mut cc, multiply(&ca, &cb).unwrap()).unwrap();
    let expected = reference_product(&ca, &cb).unwrap();
    for j in 0..5 {
        assert_relative_eq!(cc[(0, j)].re, expected[(0, j)].re, epsilon = 1e-12);
        assert_relative_eq!(cc[(0, j)].im, expected[(0, j)].im, epsilon = 1e-12);
        assert_eq!(cc[(1, j)], Complex::new(0.0, 0.0));
    }
}

/// Packed stores that run into the row padding leave it zero, even for
/// infinite and NaN products.
#[test]
fn non_finite_values_keep_padding_zero() {
    let ctx = serial(true);
    let a = CsrMatrix::from_rows(1, vec![vec![(0, f64::INFINITY)]]).unwrap();
    let b = RowMajorMatrix::from_rows(&[vec![1.0]]).unwrap();
    let mut c = RowMajorMatrix::zeros(1, 1);
    ctx.assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
    assert_eq!(c[(0, 0)], f64::INFINITY);
    let padded = DenseRows::padded_row(&c, 0);
    assert!(padded.len() > 1);
    assert!(padded[1..].iter().all(|&x| x == 0.0));

    // five nonzeros: one packed group of four plus a single trailing entry
    let a = CsrMatrix::from_rows(
        5,
        vec![vec![(0, 1.0f32), (1, 1.0), (2, f32::NAN), (3, 1.0), (4, f32::NEG_INFINITY)]],
    )
    .unwrap();
    let b = RowMajorMatrix::from_fn(5, 3, |_, _| 1.0f32);
    let mut c = RowMajorMatrix::from_fn(1, 3, |_, j| j as f32);
    ctx.add_assign(&mut c, multiply(&a, &b).unwrap()).unwrap();
    assert!((0..3).all(|j| c[(0, j)].is_nan()));
    let padded = DenseRows::padded_row(&c, 0);
    assert!(padded.len() > 3);
    assert!(padded[3..].iter().all(|&x| x == 0.0));
}
