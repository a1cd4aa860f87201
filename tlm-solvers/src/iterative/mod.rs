//! Iterative solvers for linear systems
//!
//! - [`bicgstab`]: BiCGSTAB, suited to the non-symmetric systems TLM scattering produces

mod bicgstab;

pub use bicgstab::{bicgstab, BiCgstabConfig, BiCgstabSolution};
