//! BiCGSTAB (Bi-Conjugate Gradient Stabilized) solver
//!
//! BiCGSTAB is a Krylov subspace method for non-symmetric systems.

use crate::blas_helpers::{axpy, inner_product, vector_norm};
use crate::traits::LinearOperator;
use ndarray::Array1;

const BREAKDOWN: f64 = 1e-30;

/// BiCGSTAB solver configuration
#[derive(Debug, Clone)]
pub struct BiCgstabConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
    /// Log progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for BiCgstabConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-10,
            print_interval: 0,
        }
    }
}

/// BiCGSTAB solver result
#[derive(Debug)]
pub struct BiCgstabSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the BiCGSTAB method, starting from x = 0
pub fn bicgstab<A: LinearOperator>(
    operator: &A,
    b: &Array1<f64>,
    config: &BiCgstabConfig,
) -> BiCgstabSolution {
    let n = b.len();
    let mut x = Array1::zeros(n);

    let b_norm = vector_norm(b);
    if b_norm < 1e-15 {
        return BiCgstabSolution {
            x,
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let mut r = b.clone();
    let r0 = r.clone();

    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;

    let mut p: Array1<f64> = Array1::zeros(n);
    let mut v: Array1<f64> = Array1::zeros(n);

    let stalled = |x: Array1<f64>, r: &Array1<f64>, iterations: usize| BiCgstabSolution {
        x,
        iterations,
        residual: vector_norm(r) / b_norm,
        converged: false,
    };

    for iter in 0..config.max_iterations {
        let rho_new = inner_product(&r0, &r);
        if rho_new.abs() < BREAKDOWN {
            return stalled(x, &r, iter);
        }

        let beta = (rho_new / rho) * (alpha / omega);
        rho = rho_new;

        // p = r + beta * (p - omega * v)
        axpy(-omega, &v, &mut p);
        p *= beta;
        p += &r;

        v = operator.apply(&p);

        let r0v = inner_product(&r0, &v);
        if r0v.abs() < BREAKDOWN {
            return stalled(x, &r, iter);
        }
        alpha = rho / r0v;

        // s = r - alpha * v
        let mut s = r.clone();
        axpy(-alpha, &v, &mut s);

        let s_norm = vector_norm(&s);
        if s_norm / b_norm < config.tolerance {
            axpy(alpha, &p, &mut x);
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: s_norm / b_norm,
                converged: true,
            };
        }

        let t = operator.apply(&s);
        let tt = inner_product(&t, &t);
        if tt < BREAKDOWN {
            return stalled(x, &r, iter);
        }
        omega = inner_product(&t, &s) / tt;

        // x = x + alpha * p + omega * s
        axpy(alpha, &p, &mut x);
        axpy(omega, &s, &mut x);

        // r = s - omega * t
        r = s;
        axpy(-omega, &t, &mut r);

        let rel_residual = vector_norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "BiCGSTAB iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual
            );
        }

        if rel_residual < config.tolerance {
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        if omega.abs() < BREAKDOWN {
            return stalled(x, &r, iter + 1);
        }
    }

    let residual = vector_norm(&r) / b_norm;
    BiCgstabSolution {
        x,
        iterations: config.max_iterations,
        residual,
        converged: false,
    }
}
