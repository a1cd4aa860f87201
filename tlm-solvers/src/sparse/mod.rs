//! Sparse matrix structures
//!
//! Compressed Sparse Row (CSR) storage and the triplet accumulator that the
//! assembly engine inserts into.

mod csr;
mod triplet;

pub use csr::CsrMatrix;
pub use triplet::TripletMatrix;
