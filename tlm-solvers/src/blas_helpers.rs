//! Dense vector kernels used by the iterative solvers

use ndarray::Array1;

/// Compute inner product (x, y) = Σ x_i * y_i
#[inline]
pub fn inner_product(x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ x_i^2)
#[inline]
pub fn vector_norm(x: &Array1<f64>) -> f64 {
    x.iter().map(|xi| xi * xi).sum::<f64>().sqrt()
}

/// y = y + α * x
#[inline]
pub fn axpy(alpha: f64, x: &Array1<f64>, y: &mut Array1<f64>) {
    assert_eq!(x.len(), y.len(), "Vector lengths must match for axpy");
    y.zip_mut_with(x, |yi, xi| *yi += alpha * xi);
}
