//! Local transmission-line network of one material element
//!
//! Each port p is a link line of impedance `Z_p` behind a resistance `R_p`
//! toward the element centre, where all lines meet a shunt conductance `G` and
//! a current source `Is`. The reflected voltage on port p after scattering is
//!
//! ```text
//! V^r_p = Σ_q τ_q V^i_q − V^i_p + Ẑ·Is
//! ```
//!
//! which is the local row: diagonal `τ_p − 1`, off-diagonal `τ_q`, constant
//! `Ẑ·Is`. Hyperbolic materials add an open-circuit stub as one extra port.

use super::geometry::ElementGeometry;
use crate::config::MaterialSpec;
use crate::error::{Result, TlmError};
use crate::mesh::ElementId;
use smallvec::SmallVec;

/// Local scattering data of a material element
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBlock {
    pub element: ElementId,
    /// Index into the equation's material table
    pub material: usize,
    pub real_node: usize,
    /// Real port of local port 0; geometric ports are contiguous
    pub first_port: usize,
    pub stub_port: Option<usize>,
    /// `R_p` per geometric port
    pub resistance: SmallVec<[f64; 6]>,
    /// `Z_p` per geometric port
    pub impedance: SmallVec<[f64; 6]>,
    /// `L_p` per geometric port
    pub face_measure: SmallVec<[f64; 6]>,
    /// `τ_p` per port, the stub last
    pub tau: SmallVec<[f64; 7]>,
    /// Stub impedance `Zs`
    pub stub_impedance: Option<f64>,
    /// Parallel impedance `Ẑ` seen from the centre
    pub z_hat: f64,
    /// `Ẑ·Is`, the constant of every local row
    pub source: f64,
    /// Uniform incident voltage reproducing the initial scalar
    pub initial_incident: f64,
}

/// Real numbering of an element's ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortNumbering {
    pub real_node: usize,
    pub first_port: usize,
    pub stub_port: Option<usize>,
}

impl LocalBlock {
    /// Build the local network of an element
    pub fn build(
        element: ElementId,
        material_index: usize,
        material: &MaterialSpec,
        geometry: &ElementGeometry,
        numbering: PortNumbering,
        time_step: f64,
        initial_value: f64,
    ) -> Result<Self> {
        let dim = geometry.dimension as f64;
        let hyperbolic = material.is_hyperbolic();

        let mut resistance = SmallVec::<[f64; 6]>::new();
        let mut impedance = SmallVec::<[f64; 6]>::new();
        let mut face_measure = SmallVec::<[f64; 6]>::new();
        for port in &geometry.ports {
            let r = port.distance / (material.diffusion * port.face_measure);
            let z = if hyperbolic {
                2.0 * material.relaxation_time * r / time_step
            } else {
                let line_capacitance = material.capacitance * port.face_measure / dim;
                time_step / (2.0 * line_capacitance * port.distance)
            };
            resistance.push(r);
            impedance.push(z);
            face_measure.push(port.face_measure);
        }

        let stub_impedance = if hyperbolic {
            let carried: f64 = impedance.iter().map(|z| time_step / (2.0 * z)).sum();
            let stub_capacitance = material.capacitance * geometry.measure - carried;
            if !(stub_capacitance > 0.0) {
                return Err(TlmError::config(format!(
                    "{element}: time step {time_step} too large for relaxation time {} \
                     (stub capacitance {stub_capacitance:e})",
                    material.relaxation_time
                )));
            }
            Some(time_step / (2.0 * stub_capacitance))
        } else {
            None
        };
        if hyperbolic != numbering.stub_port.is_some() {
            return Err(TlmError::config(format!(
                "{element}: stub allocation does not match its material"
            )));
        }

        let sink = geometry.measure * material.sink;
        let admittance: f64 = impedance.iter().map(|z| 1.0 / z).sum::<f64>()
            + stub_impedance.map_or(0.0, |zs| 1.0 / zs)
            + sink;
        let z_hat = 1.0 / admittance;

        let mut tau: SmallVec<[f64; 7]> = impedance.iter().map(|z| 2.0 * z_hat / z).collect();
        if let Some(zs) = stub_impedance {
            tau.push(2.0 * z_hat / zs);
        }

        let source = z_hat * geometry.measure * material.source;
        let tau_sum: f64 = tau.iter().sum();
        let initial_incident = (initial_value - source) / tau_sum;

        Ok(Self {
            element,
            material: material_index,
            real_node: numbering.real_node,
            first_port: numbering.first_port,
            stub_port: numbering.stub_port,
            resistance,
            impedance,
            face_measure,
            tau,
            stub_impedance,
            z_hat,
            source,
            initial_incident,
        })
    }

    /// Number of geometric ports
    pub fn num_geometric_ports(&self) -> usize {
        self.impedance.len()
    }

    /// Number of ports including the stub
    pub fn num_ports(&self) -> usize {
        self.tau.len()
    }

    /// Real port of a local port; the stub is the last local port
    pub fn real_port(&self, local: usize) -> usize {
        if local < self.num_geometric_ports() {
            self.first_port + local
        } else {
            self.stub_port.unwrap_or(self.first_port + local)
        }
    }

    /// Local stub port index, if any
    pub fn stub_local(&self) -> Option<usize> {
        self.stub_port.map(|_| self.num_geometric_ports())
    }

    /// Reflected-voltage row of local port `local` as `(real port, coefficient)`
    pub fn row(&self, local: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.tau.iter().enumerate().map(move |(q, &t)| {
            let value = if q == local { t - 1.0 } else { t };
            (self.real_port(q), value)
        })
    }

    /// Node-centre scalar row `Σ τ_q V^i_q`; its constant is [`LocalBlock::source`]
    pub fn centre_row(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.tau
            .iter()
            .enumerate()
            .map(move |(q, &t)| (self.real_port(q), t))
    }

    /// Sum of the local row coefficients of a port
    pub fn row_sum(&self, local: usize) -> f64 {
        self.row(local).map(|(_, v)| v).sum()
    }
}
