//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts

use crate::traits::LinearOperator;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed Sparse Row (CSR) matrix of `f64`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<f64>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl CsrMatrix {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed; entries are
    /// kept even when the sum is exactly zero so the sparsity pattern stays stable.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];

        let mut prev: Option<(usize, usize)> = None;
        for (row, col, val) in triplets {
            if prev == Some((row, col)) {
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);
                row_counts[row] += 1;
                prev = Some((row, col));
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        let mut running = 0;
        for count in row_counts {
            running += count;
            row_ptrs.push(running);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![1.0; n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Sum of the stored values of a row
    pub fn row_sum(&self, row: usize) -> f64 {
        self.values[self.row_range(row)].iter().sum()
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= 246 {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.num_rows);
        for i in 0..self.num_rows {
            y[i] = self.row_entries(i).map(|(j, v)| v * x[j]).sum();
        }
        y
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<f64>) -> Array1<f64> {
        let results: Vec<f64> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| self.row_entries(i).map(|(j, v)| v * x[j]).sum())
            .collect();
        Array1::from_vec(results)
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<f64>) -> Array1<f64> {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");

        let mut y = Array1::zeros(self.num_cols);
        for i in 0..self.num_rows {
            for (j, v) in self.row_entries(i) {
                y[j] += v * x[i];
            }
        }
        y
    }

    /// Get element at (i, j), returns 0 if not stored
    ///
    /// Columns are sorted within a row, so this is a binary search.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i >= self.num_rows {
            return 0.0;
        }
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(offset) => self.values[range.start + offset],
            Err(_) => 0.0,
        }
    }
}

impl LinearOperator for CsrMatrix {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        self.matvec(x)
    }

    fn apply_transpose(&self, x: &Array1<f64>) -> Array1<f64> {
        self.matvec_transpose(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_csr_from_triplets() {
        let triplets = vec![
            (2, 2, 5.0),
            (0, 2, 2.0),
            (1, 1, 3.0),
            (0, 0, 1.0),
            (2, 0, 4.0),
        ];

        let csr = CsrMatrix::from_triplets(3, 3, triplets);

        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.row_ptrs, vec![0, 2, 3, 5]);
        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(0, 2), 2.0);
        assert_relative_eq!(csr.get(2, 0), 4.0);
        assert_relative_eq!(csr.get(1, 0), 0.0);
    }

    #[test]
    fn test_csr_triplets_duplicate() {
        let triplets = vec![(0, 0, 1.0), (0, 0, 2.0), (1, 1, 3.0)];

        let csr = CsrMatrix::from_triplets(2, 2, triplets);

        assert_eq!(csr.nnz(), 2);
        assert_relative_eq!(csr.get(0, 0), 3.0);
    }

    #[test]
    fn test_csr_empty_rows() {
        let csr = CsrMatrix::from_triplets(4, 4, vec![(3, 1, 2.0)]);
        assert_eq!(csr.row_ptrs, vec![0, 0, 0, 0, 1]);
        assert_eq!(csr.row_entries(0).count(), 0);
        assert_relative_eq!(csr.row_sum(3), 2.0);
    }

    #[test]
    fn test_csr_matvec() {
        let csr = CsrMatrix::from_triplets(
            2,
            2,
            vec![(0, 0, 1.0), (0, 1, 2.0), (1, 0, 3.0), (1, 1, 4.0)],
        );
        let y = csr.matvec(&array![1.0, 2.0]);
        assert_relative_eq!(y[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 11.0, epsilon = 1e-12);

        let yt = csr.apply_transpose(&array![1.0, 1.0]);
        assert_relative_eq!(yt[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(yt[1], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_csr_rectangular() {
        let csr = CsrMatrix::from_triplets(1, 3, vec![(0, 2, 1.5), (0, 0, 0.5)]);
        let y = csr.matvec(&array![2.0, 7.0, 2.0]);
        assert_eq!(y.len(), 1);
        assert_relative_eq!(y[0], 4.0, epsilon = 1e-12);
        assert!(!csr.is_square());
    }
}
