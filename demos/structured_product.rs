use rand::Rng;
use spdmm::{
    CsrMatrix, LowerMatrix, MultContext, MultOptions, RowMajorMatrix, decl_sym, multiply,
};

fn main() {
    let n = 6;
    let mut rng = rand::thread_rng();

    // sparse symmetric tridiagonal matrix
    let rows: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|i| {
            let mut row = Vec::new();
            if i > 0 {
                row.push((i - 1, -1.0));
            }
            row.push((i, 2.0));
            if i + 1 < n {
                row.push((i + 1, -1.0));
            }
            row
        })
        .collect();
    let a = CsrMatrix::from_rows(n, rows).unwrap();
    let s = a.to_dense();

    let ctx = MultContext::new(MultOptions::default()).unwrap();

    // A * A is symmetric: only the lower triangle is computed, then mirrored
    let mut c = RowMajorMatrix::zeros(n, n);
    ctx.assign(&mut c, decl_sym(multiply(&a, &s).unwrap()).unwrap())
        .unwrap();
    println!("A * A =\n{:?}", c);

    // lower triangular dense operand
    let l = LowerMatrix::try_new(RowMajorMatrix::from_fn(n, n, |i, j| {
        if j <= i { rng.r#gen::<f64>() } else { 0.0 }
    }))
    .unwrap();
    let mut d = RowMajorMatrix::zeros(n, n);
    ctx.assign(&mut d, multiply(&a, &l).unwrap()).unwrap();
    ctx.sub_assign(&mut d, multiply(&a, &l).unwrap()).unwrap();
    println!("A * L - A * L =\n{:?}", d);

    let sparse = ctx.evaluate_sparse(multiply(&a, &s).unwrap());
    println!("nonzeros of A * A: {}", sparse.nnz());
}
