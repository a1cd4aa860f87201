//! Triplet accumulator backend
//!
//! Collects `(row, col, value)` entries in insertion order and compresses them
//! to CSR on demand. This is the default [`SparseBackend`] for assembly.

use super::csr::CsrMatrix;
use crate::error::SolverError;
use crate::iterative::{bicgstab, BiCgstabConfig};
use crate::traits::{LinearOperator, SparseBackend};
use ndarray::Array1;

/// Accumulating sparse matrix with a lazily built CSR form
#[derive(Debug, Clone)]
pub struct TripletMatrix {
    rows: usize,
    cols: usize,
    triplets: Vec<(usize, usize, f64)>,
    compressed: Option<CsrMatrix>,
    /// Configuration used by [`SparseBackend::solve`]
    pub solver: BiCgstabConfig,
}

impl TripletMatrix {
    /// Compressed form, if [`SparseBackend::compress`] has been called since the
    /// last insertion
    pub fn csr(&self) -> Option<&CsrMatrix> {
        self.compressed.as_ref()
    }

    /// Compress (if needed) and return the CSR form
    pub fn into_csr(mut self) -> CsrMatrix {
        match self.compressed.take() {
            Some(csr) => csr,
            None => CsrMatrix::from_triplets(self.rows, self.cols, self.triplets),
        }
    }

    /// Raw triplets in insertion order (duplicates not merged)
    pub fn triplets(&self) -> &[(usize, usize, f64)] {
        &self.triplets
    }
}

impl SparseBackend for TripletMatrix {
    fn new(rows: usize, cols: usize) -> Self {
        Self::with_capacity(rows, cols, 0)
    }

    fn with_capacity(rows: usize, cols: usize, nnz_hint: usize) -> Self {
        Self {
            rows,
            cols,
            triplets: Vec::with_capacity(nnz_hint),
            compressed: None,
            solver: BiCgstabConfig::default(),
        }
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn insert(&mut self, row: usize, col: usize, value: f64) -> Result<(), SolverError> {
        if row >= self.rows || col >= self.cols {
            return Err(SolverError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.triplets.push((row, col, value));
        self.compressed = None;
        Ok(())
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        match &self.compressed {
            Some(csr) => csr.get(row, col),
            None => self
                .triplets
                .iter()
                .filter(|&&(r, c, _)| r == row && c == col)
                .map(|&(_, _, v)| v)
                .sum(),
        }
    }

    fn compress(&mut self) {
        if self.compressed.is_none() {
            self.compressed = Some(CsrMatrix::from_triplets(
                self.rows,
                self.cols,
                self.triplets.clone(),
            ));
        }
    }

    fn solve(&self, rhs: &Array1<f64>) -> Result<Array1<f64>, SolverError> {
        if self.rows != self.cols {
            return Err(SolverError::DimensionMismatch {
                expected: self.rows,
                actual: self.cols,
            });
        }
        if rhs.len() != self.rows {
            return Err(SolverError::DimensionMismatch {
                expected: self.rows,
                actual: rhs.len(),
            });
        }
        let csr = self.compressed.as_ref().ok_or(SolverError::NotCompressed)?;

        let solution = bicgstab(csr, rhs, &self.solver);
        if !solution.converged {
            return Err(SolverError::ConvergenceFailure {
                iterations: solution.iterations,
                residual: solution.residual,
            });
        }
        log::debug!(
            "BiCGSTAB converged in {} iterations (residual {:.3e})",
            solution.iterations,
            solution.residual
        );
        Ok(solution.x)
    }

    fn nnz(&self) -> usize {
        match &self.compressed {
            Some(csr) => csr.nnz(),
            None => self.triplets.len(),
        }
    }
}

impl LinearOperator for TripletMatrix {
    fn num_rows(&self) -> usize {
        self.rows
    }

    fn num_cols(&self) -> usize {
        self.cols
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        match &self.compressed {
            Some(csr) => csr.matvec(x),
            None => {
                assert_eq!(x.len(), self.cols, "Input vector size mismatch");
                let mut y = Array1::zeros(self.rows);
                for &(r, c, v) in &self.triplets {
                    y[r] += v * x[c];
                }
                y
            }
        }
    }

    fn apply_transpose(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.rows, "Input vector size mismatch");
        let mut y = Array1::zeros(self.cols);
        for &(r, c, v) in &self.triplets {
            y[c] += v * x[r];
        }
        y
    }
}
