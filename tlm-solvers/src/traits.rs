//! Core traits for the sparse backend
//!
//! - [`LinearOperator`]: matrix-like objects that can perform matrix-vector products
//! - [`SparseBackend`]: the small surface assembly code writes through, so any
//!   sparse linear algebra library can be substituted without touching assembly

use crate::error::SolverError;
use ndarray::Array1;

/// Trait for linear operators (matrices or matrix-free representations)
pub trait LinearOperator: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<f64>) -> Array1<f64>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<f64>) -> Array1<f64>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Storage-agnostic sparse matrix used by the assembly engine
///
/// Entries are accumulated: inserting twice at the same position sums the values.
/// `compress` freezes the current entries into an efficient read/solve format;
/// inserting after `compress` is allowed and invalidates the compressed form.
pub trait SparseBackend: Sized {
    /// Create an empty `rows x cols` matrix
    fn new(rows: usize, cols: usize) -> Self;

    /// Create an empty matrix with room for `nnz_hint` entries
    fn with_capacity(rows: usize, cols: usize, nnz_hint: usize) -> Self {
        let _ = nnz_hint;
        Self::new(rows, cols)
    }

    /// Number of rows
    fn rows(&self) -> usize;

    /// Number of columns
    fn cols(&self) -> usize;

    /// Accumulate `value` at (row, col)
    fn insert(&mut self, row: usize, col: usize, value: f64) -> Result<(), SolverError>;

    /// Value at (row, col); zero when nothing is stored
    fn get(&self, row: usize, col: usize) -> f64;

    /// Merge duplicates and build the compressed representation
    fn compress(&mut self);

    /// Solve `A x = rhs` (A must be square)
    fn solve(&self, rhs: &Array1<f64>) -> Result<Array1<f64>, SolverError>;

    /// Number of stored entries (after merging when compressed)
    fn nnz(&self) -> usize;
}
