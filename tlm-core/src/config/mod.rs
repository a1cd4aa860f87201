//! Equation configuration: materials, boundaries, outputs and tag lookup
//!
//! Configuration is plain serde data, loaded from JSON by
//! [`EquationConfig::from_json_file`] or [`CaseFile::from_json_file`].

mod boundary;
mod equation;
mod material;

pub use boundary::*;
pub use equation::*;
pub use material::*;
