//! Assembly pipeline: mesh + equation → global TLM system
//!
//! Stages run in order and abort on the first error:
//!
//! 1. validate the equation and build the tag table
//! 2. lay out the real numbering ([`PortAllocator`])
//! 3. register every port and boundary reference in the [`IntersectionIndex`]
//! 4. build the local blocks ([`ElementMatrixBuilder`])
//! 5. plan and stamp the junctions ([`JunctionResolver`])
//! 6. project the requested outputs ([`OutputProjector`])
//!
//! The index, the allocator and the local blocks are dropped as soon as the
//! matrices are populated; only the [`GlobalSystem`] is returned.

use crate::config::{EquationConfig, TagTable};
use crate::element::ElementMatrixBuilder;
use crate::error::{Result, TlmError};
use crate::intersection::{IntersectionIndex, Member};
use crate::junction::{JunctionResolver, JunctionSummary};
use crate::mesh::MeshTopology;
use crate::output::{OutputLabel, OutputProjector};
use crate::ports::PortAllocator;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use solvers::{LinearOperator, SparseBackend, TripletMatrix};

/// Sizes and labels of an assembled system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLayout {
    /// Rows and columns of the scattering matrix
    pub num_ports: usize,
    pub num_geometric_ports: usize,
    pub num_stubs: usize,
    /// Material elements
    pub num_nodes: usize,
    pub num_intersections: usize,
    /// One label per output row
    pub outputs: Vec<OutputLabel>,
}

/// Assembled TLM system
///
/// One time step maps the incident voltages `x` to `M x + E`; outputs are
/// `τ_out x + E_out`.
#[derive(Debug, Clone)]
pub struct GlobalSystem<B = TripletMatrix> {
    /// Scattering matrix `M` (ports × ports)
    pub scattering: B,
    /// Source vector `E`
    pub sources: Array1<f64>,
    /// Output operator `τ_out` (outputs × ports)
    pub output_scattering: B,
    /// Output constants `E_out`
    pub output_sources: Array1<f64>,
    /// Incident voltages reproducing the initial scalar field
    pub initial_incident: Array1<f64>,
    pub layout: SystemLayout,
}

impl<B: SparseBackend + LinearOperator> GlobalSystem<B> {
    /// Advance the incident voltages by one time step
    pub fn step(&self, incident: &Array1<f64>) -> Array1<f64> {
        self.scattering.apply(incident) + &self.sources
    }

    /// Evaluate the output rows for a given incident state
    pub fn outputs(&self, incident: &Array1<f64>) -> Array1<f64> {
        self.output_scattering.apply(incident) + &self.output_sources
    }
}

/// Assemble with the default triplet backend
pub fn assemble(mesh: &MeshTopology, equation: &EquationConfig) -> Result<GlobalSystem> {
    assemble_with::<TripletMatrix>(mesh, equation)
}

/// Register material ports and boundary references under their face vertices
/// and compact the index
pub fn build_index(mesh: &MeshTopology, allocator: &PortAllocator) -> Result<IntersectionIndex> {
    let capacity = allocator.num_geometric_ports() + allocator.boundary_references().len();
    let mut index = IntersectionIndex::initiate(IntersectionIndex::levels_for(mesh), capacity)?;
    let mut face = Vec::with_capacity(4);

    for element in allocator.material_elements() {
        let Some(array) = mesh.elements_of(element.element_type) else {
            continue;
        };
        let vertices = array.vertices(element.index);
        for (local, face_vertices) in element.element_type.faces().iter().enumerate() {
            let port = allocator.abstract_port(element, local).ok_or_else(|| {
                TlmError::config(format!("{element} has no abstract port {local}"))
            })?;
            face.clear();
            face.extend(face_vertices.iter().map(|&v| vertices[v]));
            index.add(&face, Member::Port(port))?;
        }
    }

    for reference in allocator.boundary_references() {
        let element = reference.element;
        let Some(array) = mesh.elements_of(element.element_type) else {
            continue;
        };
        let vertices = array.vertices(element.index);
        let member = Member::Boundary {
            boundary: reference.boundary,
            element,
        };
        if reference.region {
            for face_vertices in element.element_type.faces() {
                face.clear();
                face.extend(face_vertices.iter().map(|&v| vertices[v]));
                index.add(&face, member)?;
            }
        } else {
            index.add(vertices, member)?;
        }
    }

    index.compact();
    Ok(index)
}

/// Assemble into any sparse backend
pub fn assemble_with<B: SparseBackend>(
    mesh: &MeshTopology,
    equation: &EquationConfig,
) -> Result<GlobalSystem<B>> {
    equation.validate()?;
    let tags: TagTable = equation.tag_table()?;
    log::info!(
        "assembling TLM system: {} nodes, {} elements, {} materials, {} boundaries",
        mesh.num_nodes(),
        mesh.num_elements(),
        equation.materials.len(),
        equation.boundaries.len()
    );

    let allocator = PortAllocator::initiate(mesh, equation, &tags)?;
    let num_ports = allocator.num_real_ports();
    log::info!(
        "{}D mesh: {} material elements, {} ports ({} stubs)",
        allocator.dimension(),
        allocator.num_real_nodes(),
        num_ports,
        allocator.num_stubs()
    );

    let index = build_index(mesh, &allocator)?;
    let num_intersections = index.len();

    let blocks = ElementMatrixBuilder::new(mesh, equation, &tags, &allocator).build_all()?;

    let resolver = JunctionResolver::new(mesh, equation, &index, &allocator, &blocks);
    let (junctions, summary): (_, JunctionSummary) = resolver.plan()?;

    let nnz_hint: usize = blocks.iter().map(|b| 2 * b.num_ports() * b.num_ports()).sum();
    let mut scattering = B::with_capacity(num_ports, num_ports, nnz_hint);
    let mut sources = Array1::zeros(num_ports);
    resolver.stamp(&junctions, &mut scattering, &mut sources)?;

    let rows = OutputProjector::new(equation.outputs, &blocks).project(&junctions);
    let output_nnz: usize = rows.iter().map(|r| r.entries.len()).sum();
    let mut output_scattering = B::with_capacity(rows.len(), num_ports, output_nnz);
    let mut output_sources = Array1::zeros(rows.len());
    let mut outputs = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        for &(col, value) in &row.entries {
            output_scattering.insert(i, col, value)?;
        }
        output_sources[i] = row.constant;
        outputs.push(row.label);
    }

    let mut initial_incident = Array1::zeros(num_ports);
    for block in &blocks {
        for local in 0..block.num_ports() {
            initial_incident[block.real_port(local)] = block.initial_incident;
        }
    }

    let layout = SystemLayout {
        num_ports,
        num_geometric_ports: allocator.num_geometric_ports(),
        num_stubs: allocator.num_stubs(),
        num_nodes: allocator.num_real_nodes(),
        num_intersections,
        outputs,
    };
    drop(junctions);
    drop(blocks);
    drop(index);
    drop(allocator);

    scattering.compress();
    output_scattering.compress();
    log::info!(
        "assembled {}x{} scattering matrix ({} nonzeros), {} output rows; \
         junctions: {} two-port, {} boundary, {} single, {} skipped",
        num_ports,
        num_ports,
        scattering.nnz(),
        layout.outputs.len(),
        summary.two_port,
        summary.boundary,
        summary.single,
        summary.skipped
    );

    Ok(GlobalSystem {
        scattering,
        sources,
        output_scattering,
        output_sources,
        initial_incident,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundaryCondition, BoundarySpec, MaterialSpec};
    use crate::mesh::{line_mesh, MATERIAL_TAG, X_MAX_TAG, X_MIN_TAG};
    use approx::assert_relative_eq;

    #[test]
    fn test_assemble_line_sizes() {
        let mesh = line_mesh(0.0, 1.0, 4);
        let equation = EquationConfig::new(0.01)
            .with_material(MaterialSpec::new(vec![MATERIAL_TAG], 1.0, 1.0))
            .with_boundary(BoundarySpec::new(
                vec![X_MIN_TAG, X_MAX_TAG],
                BoundaryCondition::Adiabatic,
            ));
        let system = assemble(&mesh, &equation).unwrap();

        assert_eq!(system.layout.num_ports, 8);
        assert_eq!(system.layout.num_nodes, 4);
        assert_eq!(system.layout.num_intersections, 5);
        assert_eq!(system.sources.len(), 8);
        assert!(system.layout.outputs.is_empty());
        assert_eq!(system.scattering.rows(), 8);
    }

    #[test]
    fn test_uniform_state_is_preserved() {
        let mesh = line_mesh(0.0, 1.0, 5);
        let equation = EquationConfig::new(0.01)
            .with_material(MaterialSpec::new(vec![MATERIAL_TAG], 1.0, 1.0))
            .with_boundary(BoundarySpec::new(
                vec![X_MIN_TAG, X_MAX_TAG],
                BoundaryCondition::Adiabatic,
            ))
            .with_initial_value(3.0);
        let system = assemble(&mesh, &equation).unwrap();

        let next = system.step(&system.initial_incident);
        for (a, b) in next.iter().zip(system.initial_incident.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}
