//! Merging of local element rows into the global scattering system
//!
//! Every intersection connects the ports that share one face. The resolver
//! works in two phases: [`JunctionResolver::plan`] classifies each
//! intersection and validates its topology and boundary condition without
//! touching the matrix; [`JunctionResolver::stamp`] then writes the rows. A
//! failure in the first phase leaves nothing half assembled.
//!
//! The incident voltage on port p at the next step is a combination of the
//! reflected voltages of the ports in its intersection, each reflected voltage
//! being a local row (see [`LocalBlock`]). Every stamped row keeps
//! `reflection + transmission = 1`, so a uniform state is preserved.

use crate::config::{BoundaryCondition, EquationConfig};
use crate::element::LocalBlock;
use crate::error::{Result, TlmError};
use crate::intersection::{IntersectionIndex, Member};
use crate::mesh::{ElementId, MeshTopology};
use crate::ports::PortAllocator;
use ndarray::Array1;
use smallvec::SmallVec;
use solvers::SparseBackend;

/// A port addressed by its element's real node and its local index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef {
    /// Real node, which is also the index of the element's [`LocalBlock`]
    pub node: usize,
    pub local: usize,
}

/// Coefficients of a two-port junction
///
/// `D = R1 + Z1 + R2 + Z2`; line p sees `R_p + R_q + Z_q`, hence
/// `reflection_p = 1 − 2 Z_p / D` and `transmission_{q→p} = 2 Z_p / D`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPortCoefficients {
    pub denominator: f64,
    /// Reflection seen by each port
    pub reflection: [f64; 2],
    /// `transmission[p]` carries the other port's reflected wave into port p
    pub transmission: [f64; 2],
}

impl TwoPortCoefficients {
    pub fn new(r1: f64, z1: f64, r2: f64, z2: f64) -> Self {
        let denominator = r1 + z1 + r2 + z2;
        let reflection = [1.0 - 2.0 * z1 / denominator, 1.0 - 2.0 * z2 / denominator];
        Self {
            denominator,
            reflection,
            transmission: [1.0 - reflection[0], 1.0 - reflection[1]],
        }
    }
}

/// Coefficients of a port terminated by a boundary condition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCoefficients {
    pub reflection: f64,
    /// Constant injected into the incident voltage `B`
    pub source: f64,
}

impl BoundaryCoefficients {
    /// Termination of a line of impedance `z` behind resistance `r` on a face
    /// of measure `face_measure`; `None` for conditions without an implementation
    pub fn new(condition: &BoundaryCondition, r: f64, z: f64, face_measure: f64) -> Option<Self> {
        Some(match *condition {
            BoundaryCondition::Adiabatic => Self {
                reflection: 1.0,
                source: 0.0,
            },
            BoundaryCondition::Value { value } => Self {
                reflection: (r - z) / (r + z),
                source: value * z / (r + z),
            },
            BoundaryCondition::Flux { flux } => Self {
                reflection: 1.0,
                source: flux * z * face_measure,
            },
            BoundaryCondition::Convective {
                ambient,
                coefficient,
            } => {
                let rc = 1.0 / (coefficient * face_measure);
                Self {
                    reflection: (rc + r - z) / (rc + r + z),
                    source: ambient * z / (rc + r + z),
                }
            }
            BoundaryCondition::Radiative { .. } => return None,
        })
    }
}

/// Resolved junction of one intersection
#[derive(Debug, Clone, PartialEq)]
pub enum Junction {
    /// A lone port: adiabatic termination
    Single { intersection: usize, port: PortRef },
    /// A port facing a boundary element
    Boundary {
        intersection: usize,
        port: PortRef,
        condition: BoundaryCondition,
        /// Index into the equation's boundary table
        boundary: usize,
        /// Tag of the boundary element
        tag: i32,
    },
    /// Two ports of neighbouring elements
    TwoPort {
        intersection: usize,
        ports: [PortRef; 2],
    },
}

impl Junction {
    pub fn intersection(&self) -> usize {
        match self {
            Junction::Single { intersection, .. }
            | Junction::Boundary { intersection, .. }
            | Junction::TwoPort { intersection, .. } => *intersection,
        }
    }
}

/// Counts collected while planning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JunctionSummary {
    pub single: usize,
    pub boundary: usize,
    pub two_port: usize,
    /// Intersections without a material port
    pub empty: usize,
    /// Multi-port intersections skipped in lenient mode
    pub skipped: usize,
}

/// Plans and stamps junctions over a compacted intersection index
pub struct JunctionResolver<'a> {
    mesh: &'a MeshTopology,
    equation: &'a EquationConfig,
    index: &'a IntersectionIndex,
    allocator: &'a PortAllocator,
    blocks: &'a [LocalBlock],
}

impl<'a> JunctionResolver<'a> {
    pub fn new(
        mesh: &'a MeshTopology,
        equation: &'a EquationConfig,
        index: &'a IntersectionIndex,
        allocator: &'a PortAllocator,
        blocks: &'a [LocalBlock],
    ) -> Self {
        Self {
            mesh,
            equation,
            index,
            allocator,
            blocks,
        }
    }

    fn unsupported(&self, intersection: usize, reason: impl Into<String>) -> TlmError {
        TlmError::UnsupportedTopology {
            intersection,
            vertices: self.index.key(intersection).to_vec(),
            reason: reason.into(),
        }
    }

    fn element_tag(&self, element: ElementId) -> i32 {
        self.mesh
            .elements_of(element.element_type)
            .map_or(0, |array| array.tag(element.index))
    }

    /// Classify every intersection and validate it
    pub fn plan(&self) -> Result<(Vec<Junction>, JunctionSummary)> {
        let mut junctions = Vec::new();
        junctions
            .try_reserve(self.index.len())
            .map_err(|_| TlmError::Allocation {
                what: "junction plan",
                requested: self.index.len(),
            })?;
        let mut visited = vec![false; self.allocator.num_geometric_ports()];
        let mut summary = JunctionSummary::default();

        for (intersection, members) in self.index.iter() {
            let mut ports = SmallVec::<[PortRef; 2]>::new();
            let mut boundaries = SmallVec::<[(usize, ElementId); 2]>::new();

            for member in members {
                match *member {
                    Member::Port(port) => {
                        let (element, local) = self.allocator.locate(port).ok_or_else(|| {
                            let reason = format!("unknown abstract port {}", port.0);
                            self.unsupported(intersection, reason)
                        })?;
                        let (node, first_port) =
                            self.allocator.real_node_and_port(element).ok_or_else(|| {
                                let reason = format!("{element} owns no real port");
                                self.unsupported(intersection, reason)
                            })?;
                        let real = first_port + local;
                        if std::mem::replace(&mut visited[real], true) {
                            return Err(self.unsupported(
                                intersection,
                                format!("port {local} of {element} is counted twice"),
                            ));
                        }
                        ports.push(PortRef { node, local });
                    }
                    Member::Boundary { boundary, element } => boundaries.push((boundary, element)),
                }
            }

            if let Some(&(first, _)) = boundaries.first() {
                if boundaries.iter().any(|&(b, _)| b != first) {
                    return Err(self.unsupported(
                        intersection,
                        "boundary references resolve to different boundary specifications",
                    ));
                }
            }

            let junction = match (ports.as_slice(), boundaries.first()) {
                ([], _) => {
                    summary.empty += 1;
                    continue;
                }
                (&[port], None) => {
                    summary.single += 1;
                    Junction::Single { intersection, port }
                }
                (&[port], Some(&(boundary, element))) => {
                    let condition = *self.equation.boundaries[boundary]
                        .condition(self.equation.boundary_rank)?;
                    let tag = self.element_tag(element);
                    if let BoundaryCondition::Radiative { .. } = condition {
                        return Err(TlmError::UnimplementedBoundary {
                            kind: condition.kind(),
                            tag,
                            intersection,
                        });
                    }
                    summary.boundary += 1;
                    Junction::Boundary {
                        intersection,
                        port,
                        condition,
                        boundary,
                        tag,
                    }
                }
                (&[a, b], None) => {
                    summary.two_port += 1;
                    Junction::TwoPort {
                        intersection,
                        ports: [a, b],
                    }
                }
                (&[_, _], Some(_)) => {
                    return Err(self.unsupported(
                        intersection,
                        "a boundary reference is shared by two material ports",
                    ));
                }
                (many, _) => {
                    if self.equation.strict_topology {
                        return Err(self.unsupported(
                            intersection,
                            format!("{} material ports meet at one face", many.len()),
                        ));
                    }
                    log::warn!(
                        "skipping intersection {} (vertices {:?}): {} material ports share it",
                        intersection,
                        self.index.key(intersection),
                        many.len()
                    );
                    summary.skipped += 1;
                    continue;
                }
            };
            junctions.push(junction);
        }

        log::debug!(
            "junction plan: {} single, {} boundary, {} two-port, {} empty, {} skipped",
            summary.single,
            summary.boundary,
            summary.two_port,
            summary.empty,
            summary.skipped
        );
        Ok((junctions, summary))
    }

    fn block(&self, port: PortRef) -> &LocalBlock {
        &self.blocks[port.node]
    }

    fn stamp_row<B: SparseBackend>(
        &self,
        scattering: &mut B,
        row: usize,
        port: PortRef,
        scale: f64,
    ) -> Result<()> {
        for (col, value) in self.block(port).row(port.local) {
            scattering.insert(row, col, scale * value)?;
        }
        Ok(())
    }

    /// Write the planned junction rows, then the stub rows
    pub fn stamp<B: SparseBackend>(
        &self,
        junctions: &[Junction],
        scattering: &mut B,
        sources: &mut Array1<f64>,
    ) -> Result<()> {
        for junction in junctions {
            match *junction {
                Junction::Single { port, .. } => {
                    let block = self.block(port);
                    let row = block.real_port(port.local);
                    self.stamp_row(scattering, row, port, 1.0)?;
                    sources[row] = block.source;
                }
                Junction::Boundary {
                    intersection,
                    port,
                    ref condition,
                    tag,
                    ..
                } => {
                    let block = self.block(port);
                    let row = block.real_port(port.local);
                    let coefficients = BoundaryCoefficients::new(
                        condition,
                        block.resistance[port.local],
                        block.impedance[port.local],
                        block.face_measure[port.local],
                    )
                    .ok_or(TlmError::UnimplementedBoundary {
                        kind: condition.kind(),
                        tag,
                        intersection,
                    })?;
                    self.stamp_row(scattering, row, port, coefficients.reflection)?;
                    sources[row] = coefficients.reflection * block.source + coefficients.source;
                }
                Junction::TwoPort { ports, .. } => {
                    let [a, b] = ports;
                    let (block_a, block_b) = (self.block(a), self.block(b));
                    let coefficients = TwoPortCoefficients::new(
                        block_a.resistance[a.local],
                        block_a.impedance[a.local],
                        block_b.resistance[b.local],
                        block_b.impedance[b.local],
                    );
                    for (p, (own, other)) in [(a, b), (b, a)].into_iter().enumerate() {
                        let row = self.block(own).real_port(own.local);
                        let reflection = coefficients.reflection[p];
                        let transmission = coefficients.transmission[p];
                        self.stamp_row(scattering, row, own, reflection)?;
                        self.stamp_row(scattering, row, other, transmission)?;
                        sources[row] = reflection * self.block(own).source
                            + transmission * self.block(other).source;
                    }
                }
            }
        }

        // Open-circuit stubs reflect their whole wave back
        for block in self.blocks {
            if let (Some(row), Some(local)) = (block.stub_port, block.stub_local()) {
                let port = PortRef {
                    node: block.real_node,
                    local,
                };
                self.stamp_row(scattering, row, port, 1.0)?;
                sources[row] = block.source;
            }
        }
        Ok(())
    }
}
