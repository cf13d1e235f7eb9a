use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use faer::Mat;
use spdmm::{
    ColMajorMatrix, CsrMatrix, MultContext, MultOptions, RowMajorMatrix, UpperMatrix, decl_sym,
    multiply,
};

/// Symmetric banded matrix with `width` nonzeros on each side of the diagonal.
fn banded_csr(n: usize, width: usize) -> CsrMatrix<f64> {
    let rows = (0..n)
        .map(|i| {
            (i.saturating_sub(width)..(i + width + 1).min(n))
                .map(|j| (j, ((i * j + i + j) % 13) as f64 - 6.0))
                .collect()
        })
        .collect();
    CsrMatrix::from_rows(n, rows).unwrap()
}

fn bench_kernel_tiers(c: &mut Criterion) {
    let n = 400;
    let a = banded_csr(n, 8);
    let b = RowMajorMatrix::from_fn(n, 64, |i, j| ((i + 2 * j) as f64).sin());

    let vectorized = MultContext::new(MultOptions::serial()).unwrap();
    let scalar = MultContext::new(MultOptions::serial().with_optimized_kernels(false)).unwrap();
    let parallel = MultContext::default();

    let mut group = c.benchmark_group("sparse x dense");
    group.bench_function("vectorized", |ben| {
        let mut out = RowMajorMatrix::zeros(n, 64);
        ben.iter(|| {
            vectorized
                .assign(&mut out, multiply(black_box(&a), black_box(&b)).unwrap())
                .unwrap()
        })
    });
    group.bench_function("unrolled (column-major target)", |ben| {
        let mut out = ColMajorMatrix::zeros(n, 64);
        ben.iter(|| {
            vectorized
                .assign(&mut out, multiply(black_box(&a), black_box(&b)).unwrap())
                .unwrap()
        })
    });
    group.bench_function("default", |ben| {
        let mut out = RowMajorMatrix::zeros(n, 64);
        ben.iter(|| {
            scalar
                .assign(&mut out, multiply(black_box(&a), black_box(&b)).unwrap())
                .unwrap()
        })
    });
    group.bench_function("parallel", |ben| {
        let mut out = RowMajorMatrix::zeros(n, 64);
        ben.iter(|| {
            parallel
                .assign(&mut out, multiply(black_box(&a), black_box(&b)).unwrap())
                .unwrap()
        })
    });
    group.bench_function("faer dense", |ben| {
        let ad: Mat<f64> = a.to_dense().to_faer();
        let bd: Mat<f64> = b.to_faer();
        ben.iter(|| black_box(&ad) * black_box(&bd))
    });
    group.finish();
}

fn bench_structure(c: &mut Criterion) {
    let ctx = MultContext::new(MultOptions::serial()).unwrap();
    let mut group = c.benchmark_group("structure");
    for n in [64, 256] {
        let a = banded_csr(n, 4);
        let sym = a.to_dense();
        let upper = UpperMatrix::try_new(RowMajorMatrix::from_fn(n, n, |i, j| {
            if j >= i { 1.0 / (1 + j - i) as f64 } else { 0.0 }
        }))
        .unwrap();

        group.bench_with_input(BenchmarkId::new("general", n), &n, |ben, &n| {
            let mut out = RowMajorMatrix::zeros(n, n);
            ben.iter(|| ctx.assign(&mut out, multiply(&a, &sym).unwrap()).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("symmetric", n), &n, |ben, &n| {
            let mut out = RowMajorMatrix::zeros(n, n);
            ben.iter(|| {
                ctx.assign(&mut out, decl_sym(multiply(&a, &sym).unwrap()).unwrap())
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("upper operand", n), &n, |ben, &n| {
            let mut out = RowMajorMatrix::zeros(n, n);
            ben.iter(|| ctx.assign(&mut out, multiply(&a, &upper).unwrap()).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernel_tiers, bench_structure);
criterion_main!(benches);
