//! Errors raised by the sparse backend and its solvers

use thiserror::Error;

/// Solver and storage errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// The operation needs the compressed (CSR) form
    #[error("matrix has not been compressed")]
    NotCompressed,
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("entry ({row}, {col}) lies outside a {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("solver failed to converge after {iterations} iterations (residual: {residual:.3e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },
}
