use super::view::{MatrixMut, MatrixRef};

/// Naive GEMM using i-j-k loop order: C = alpha * A * B + beta * C
///
/// This is the textbook triple loop. Every dot product is summed in `f64`
/// and rounded once, so it is the most accurate answer the fast paths can
/// be measured against, and beta == 0 discards C entirely (NaN included).
///
/// Use this as a correctness baseline, not for performance.
///
/// # Arguments
///
/// * `a` - Matrix A (m × k), any strides
/// * `b` - Matrix B (k × n), any strides
/// * `c` - Matrix C (m × n), updated in place
///
/// # Panics
///
/// Panics if the operand shapes don't agree.
pub fn gemm_naive(alpha: f32, a: MatrixRef<'_>, b: MatrixRef<'_>, beta: f32, c: &mut MatrixMut<'_>) {
    let (m, k, n) = (a.rows(), a.cols(), b.cols());
    assert_eq!(b.rows(), k, "B: expected {} rows, got {}", k, b.rows());
    assert_eq!(c.rows(), m, "C: expected {} rows, got {}", m, c.rows());
    assert_eq!(c.cols(), n, "C: expected {} cols, got {}", n, c.cols());

    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0f64;
            for p in 0..k {
                acc += a.get(i, p) as f64 * b.get(p, j) as f64;
            }
            let prior = if beta == 0.0 {
                0.0
            } else {
                beta as f64 * c.get(i, j) as f64
            };
            c.set(i, j, (prior + alpha as f64 * acc) as f32);
        }
    }
}
