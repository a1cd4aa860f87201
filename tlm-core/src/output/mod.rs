//! Auxiliary output rows over the incident voltages
//!
//! Node-centre scalars, scalars between neighbouring centres (or on a boundary)
//! and face flux densities are all linear in the incident voltages once the
//! reflected voltages and centre scalars are replaced by their local rows. Each
//! output is therefore one sparse row of `τ_out` plus a constant of `E_out`.

use crate::config::{BetweenApproximation, BoundaryCondition, OutputRequest};
use crate::element::LocalBlock;
use crate::junction::{Junction, PortRef, TwoPortCoefficients};
use crate::mesh::ElementId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What an output row measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLabel {
    /// Scalar at an element centre
    NodeCenter { element: ElementId },
    /// Scalar on the face shared by `element` and `neighbour`, or on a boundary face
    Between {
        intersection: usize,
        element: ElementId,
        neighbour: Option<ElementId>,
    },
    /// Flux density leaving `element` through the face
    Flux {
        intersection: usize,
        element: ElementId,
        neighbour: Option<ElementId>,
    },
}

/// One output: `Σ coefficient · V^i[port] + constant`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub label: OutputLabel,
    pub entries: SmallVec<[(usize, f64); 14]>,
    pub constant: f64,
}

impl OutputRow {
    fn new(label: OutputLabel) -> Self {
        Self {
            label,
            entries: SmallVec::new(),
            constant: 0.0,
        }
    }

    /// Add `scale` times the reflected voltage of a port
    fn add_reflected(&mut self, block: &LocalBlock, local: usize, scale: f64) {
        self.entries
            .extend(block.row(local).map(|(col, value)| (col, scale * value)));
        self.constant += scale * block.source;
    }

    /// Add `scale` times the centre scalar of an element
    fn add_centre(&mut self, block: &LocalBlock, scale: f64) {
        self.entries
            .extend(block.centre_row().map(|(col, value)| (col, scale * value)));
        self.constant += scale * block.source;
    }

    /// Value of the row for a given incident vector
    pub fn evaluate(&self, incident: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(col, value)| value * incident[col])
            .sum::<f64>()
            + self.constant
    }
}

/// Builds output rows from local blocks and the junction plan
pub struct OutputProjector<'a> {
    request: OutputRequest,
    blocks: &'a [LocalBlock],
}

impl<'a> OutputProjector<'a> {
    pub fn new(request: OutputRequest, blocks: &'a [LocalBlock]) -> Self {
        Self { request, blocks }
    }

    /// All requested rows: node centres in real node order, then between-point
    /// scalars, then fluxes, both in intersection order
    pub fn project(&self, junctions: &[Junction]) -> Vec<OutputRow> {
        let mut rows = Vec::new();
        if self.request.node_center {
            rows.extend(self.blocks.iter().map(Self::node_center));
        }
        if self.request.between {
            rows.extend(junctions.iter().map(|j| self.between(j)));
        }
        if self.request.flux {
            rows.extend(junctions.iter().map(|j| self.flux(j)));
        }
        rows
    }

    fn block(&self, port: PortRef) -> &LocalBlock {
        &self.blocks[port.node]
    }

    /// Scalar at an element centre
    pub fn node_center(block: &LocalBlock) -> OutputRow {
        let mut row = OutputRow::new(OutputLabel::NodeCenter {
            element: block.element,
        });
        row.add_centre(block, 1.0);
        row
    }

    fn two_port_parts(
        &self,
        ports: [PortRef; 2],
    ) -> ([&LocalBlock; 2], [f64; 2], TwoPortCoefficients) {
        let blocks = [self.block(ports[0]), self.block(ports[1])];
        let r = [
            blocks[0].resistance[ports[0].local],
            blocks[1].resistance[ports[1].local],
        ];
        let z = [
            blocks[0].impedance[ports[0].local],
            blocks[1].impedance[ports[1].local],
        ];
        (blocks, r, TwoPortCoefficients::new(r[0], z[0], r[1], z[1]))
    }

    /// Scalar on the face of a junction
    pub fn between(&self, junction: &Junction) -> OutputRow {
        let approximation = self.request.approximation;
        match *junction {
            Junction::TwoPort {
                intersection,
                ports,
            } => {
                let (blocks, r, coefficients) = self.two_port_parts(ports);
                let mut row = OutputRow::new(OutputLabel::Between {
                    intersection,
                    element: blocks[0].element,
                    neighbour: Some(blocks[1].element),
                });
                match approximation {
                    BetweenApproximation::FromReflected => {
                        let d = coefficients.denominator;
                        let z = [
                            blocks[0].impedance[ports[0].local],
                            blocks[1].impedance[ports[1].local],
                        ];
                        row.add_reflected(blocks[0], ports[0].local, 2.0 * (z[1] + r[1]) / d);
                        row.add_reflected(blocks[1], ports[1].local, 2.0 * (z[0] + r[0]) / d);
                    }
                    BetweenApproximation::FromNodeCenter => {
                        let total = r[0] + r[1];
                        row.add_centre(blocks[0], r[1] / total);
                        row.add_centre(blocks[1], r[0] / total);
                    }
                }
                row
            }
            Junction::Single { intersection, port } => {
                self.boundary_between(intersection, port, &BoundaryCondition::Adiabatic)
            }
            Junction::Boundary {
                intersection,
                port,
                ref condition,
                ..
            } => self.boundary_between(intersection, port, condition),
        }
    }

    fn boundary_between(
        &self,
        intersection: usize,
        port: PortRef,
        condition: &BoundaryCondition,
    ) -> OutputRow {
        let block = self.block(port);
        let (r, z, l) = (
            block.resistance[port.local],
            block.impedance[port.local],
            block.face_measure[port.local],
        );
        let mut row = OutputRow::new(OutputLabel::Between {
            intersection,
            element: block.element,
            neighbour: None,
        });
        let reflected = self.request.approximation == BetweenApproximation::FromReflected;

        match *condition {
            BoundaryCondition::Value { value } => row.constant = value,
            BoundaryCondition::Flux { flux } => {
                if reflected {
                    row.add_reflected(block, port.local, 2.0);
                    row.constant += (z + r) * flux * l;
                } else {
                    row.add_centre(block, 1.0);
                    row.constant += r * flux * l;
                }
            }
            BoundaryCondition::Convective {
                ambient,
                coefficient,
            } => {
                let rc = 1.0 / (coefficient * l);
                if reflected {
                    let s = z + r + rc;
                    row.add_reflected(block, port.local, 2.0 * rc / s);
                    row.constant += ambient * (z + r) / s;
                } else {
                    row.add_centre(block, rc / (r + rc));
                    row.constant += ambient * r / (r + rc);
                }
            }
            // Radiative terminations never reach the plan
            BoundaryCondition::Adiabatic | BoundaryCondition::Radiative { .. } => {
                if reflected {
                    row.add_reflected(block, port.local, 2.0);
                } else {
                    row.add_centre(block, 1.0);
                }
            }
        }
        row
    }

    /// Flux density through the face of a junction, leaving the first element
    pub fn flux(&self, junction: &Junction) -> OutputRow {
        match *junction {
            Junction::TwoPort {
                intersection,
                ports,
            } => {
                let (blocks, _, coefficients) = self.two_port_parts(ports);
                let l = blocks[0].face_measure[ports[0].local];
                let scale = 2.0 / (coefficients.denominator * l);
                let mut row = OutputRow::new(OutputLabel::Flux {
                    intersection,
                    element: blocks[0].element,
                    neighbour: Some(blocks[1].element),
                });
                row.add_reflected(blocks[0], ports[0].local, scale);
                row.add_reflected(blocks[1], ports[1].local, -scale);
                row
            }
            Junction::Single { intersection, port } => {
                self.boundary_flux(intersection, port, &BoundaryCondition::Adiabatic)
            }
            Junction::Boundary {
                intersection,
                port,
                ref condition,
                ..
            } => self.boundary_flux(intersection, port, condition),
        }
    }

    fn boundary_flux(
        &self,
        intersection: usize,
        port: PortRef,
        condition: &BoundaryCondition,
    ) -> OutputRow {
        let block = self.block(port);
        let (r, z, l) = (
            block.resistance[port.local],
            block.impedance[port.local],
            block.face_measure[port.local],
        );
        let mut row = OutputRow::new(OutputLabel::Flux {
            intersection,
            element: block.element,
            neighbour: None,
        });

        match *condition {
            BoundaryCondition::Value { value } => {
                let scale = 1.0 / ((z + r) * l);
                row.add_reflected(block, port.local, 2.0 * scale);
                row.constant -= value * scale;
            }
            BoundaryCondition::Flux { flux } => row.constant = -flux,
            BoundaryCondition::Convective {
                ambient,
                coefficient,
            } => {
                let scale = 1.0 / ((z + r + 1.0 / (coefficient * l)) * l);
                row.add_reflected(block, port.local, 2.0 * scale);
                row.constant -= ambient * scale;
            }
            BoundaryCondition::Adiabatic | BoundaryCondition::Radiative { .. } => {}
        }
        row
    }
}
