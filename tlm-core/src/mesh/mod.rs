//! Mesh topology and generators for TLM assembly
//!
//! The assembly engine consumes an already populated [`MeshTopology`]; the
//! generators build tagged structured meshes for tests and demos.

mod generators;
mod types;

pub use generators::*;
pub use types::*;
