//! Transmission-Line Modeling assembly engine
//!
//! This crate turns an unstructured mesh plus material and boundary tags into
//! the sparse TLM system of a diffusion, heat or Pennes bioheat equation:
//! a scattering matrix `M` and source vector `E` advancing the incident
//! voltages by one time step, and output operators `τ_out`/`E_out` for
//! node-centre scalars, face scalars and fluxes.
//!
//! # Features
//!
//! - **Element types**: lines, triangles, quadrangles, tetrahedra, hexahedra,
//!   prisms and pyramids
//! - **Adjacency discovery**: hash-indexed intersections of face vertex sets
//! - **Compact numbering**: boundary-only and non-material regions excluded
//! - **Boundary conditions**: adiabatic, value, flux and convective
//! - **Hyperbolic materials**: relaxation-time stubs
//! - **Pluggable storage**: any [`solvers::SparseBackend`]
//!
//! # Example
//!
//! ```ignore
//! use tlm_core::{assemble, config::*, mesh};
//!
//! let mesh = mesh::line_mesh(0.0, 1.0, 10);
//! let equation = EquationConfig::new(1e-3)
//!     .with_material(MaterialSpec::new(vec![mesh::MATERIAL_TAG], 1.0, 1.0))
//!     .with_boundary(BoundarySpec::new(
//!         vec![mesh::X_MIN_TAG, mesh::X_MAX_TAG],
//!         BoundaryCondition::Value { value: 0.0 },
//!     ));
//! let system = assemble(&mesh, &equation)?;
//! let next = system.step(&system.initial_incident);
//! ```

pub mod assembly;
pub mod config;
pub mod element;
pub mod error;
pub mod intersection;
pub mod junction;
pub mod mesh;
pub mod output;
pub mod ports;

pub use assembly::{assemble, assemble_with, GlobalSystem, SystemLayout};
pub use error::{Result, TlmError};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
