//! Sparse storage and linear solvers for TLM systems
//!
//! This crate provides the sparse backend the assembly engine writes into:
//!
//! - **Backend trait**: [`SparseBackend`] with `insert`, `get`, `compress` and `solve`,
//!   so assembly code never touches a storage format directly
//! - **Triplet accumulator**: [`TripletMatrix`], the default backend, accumulating
//!   duplicate entries and compressing to CSR on demand
//! - **CSR storage**: [`CsrMatrix`] with matrix-vector products
//! - **Iterative solver**: BiCGSTAB for the non-symmetric systems TLM produces
//!
//! # Example
//!
//! ```ignore
//! use tlm_solvers::{SparseBackend, TripletMatrix};
//!
//! let mut a = TripletMatrix::new(2, 2);
//! a.insert(0, 0, 4.0);
//! a.insert(1, 1, 2.0);
//! a.compress();
//! let x = a.solve(&ndarray::array![8.0, 2.0])?;
//! ```

pub mod blas_helpers;
pub mod error;
pub mod iterative;
pub mod sparse;
pub mod traits;

pub use error::SolverError;
pub use iterative::{bicgstab, BiCgstabConfig, BiCgstabSolution};
pub use sparse::{CsrMatrix, TripletMatrix};
pub use traits::{LinearOperator, SparseBackend};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
