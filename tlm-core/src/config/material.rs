//! Material coefficients for diffusion, heat and bioheat equations
//!
//! Every equation handled by the engine has the form
//! `c ∂u/∂t + τr c ∂²u/∂t² = ∇·(k ∇u) − a u + s`, the relaxation term being
//! present only for hyperbolic materials.

use crate::error::{Result, TlmError};
use serde::{Deserialize, Serialize};

/// Coefficients of one material region, selected by a list of element tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Human-readable name used in log messages
    #[serde(default)]
    pub name: String,
    /// Element tags selecting this material
    pub tags: Vec<i32>,
    /// Diffusion coefficient `k` (thermal conductivity for heat)
    pub diffusion: f64,
    /// Capacitance coefficient `c` (ρ·cp for heat)
    pub capacitance: f64,
    /// Sink coefficient `a`
    #[serde(default)]
    pub sink: f64,
    /// Volumetric source `s`
    #[serde(default)]
    pub source: f64,
    /// Relaxation time `τr`; a positive value makes the material hyperbolic
    #[serde(default)]
    pub relaxation_time: f64,
    /// Initial scalar overriding the equation-wide initial value
    #[serde(default)]
    pub initial_value: Option<f64>,
}

/// Tissue and blood properties of the Pennes bioheat equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PennesParameters {
    /// Tissue thermal conductivity (W/m/K)
    pub conductivity: f64,
    /// Tissue density (kg/m³)
    pub density: f64,
    /// Tissue specific heat (J/kg/K)
    pub specific_heat: f64,
    /// Blood perfusion rate (1/s)
    pub perfusion: f64,
    /// Blood density (kg/m³)
    pub blood_density: f64,
    /// Blood specific heat (J/kg/K)
    pub blood_specific_heat: f64,
    /// Arterial blood temperature
    pub arterial_temperature: f64,
    /// Metabolic heat generation (W/m³)
    pub metabolic_heat: f64,
}

impl MaterialSpec {
    /// Pure diffusion material without sink or source
    pub fn new(tags: Vec<i32>, diffusion: f64, capacitance: f64) -> Self {
        Self {
            name: String::new(),
            tags,
            diffusion,
            capacitance,
            sink: 0.0,
            source: 0.0,
            relaxation_time: 0.0,
            initial_value: None,
        }
    }

    /// Heat conduction: `k = conductivity`, `c = density · specific_heat`
    pub fn heat(tags: Vec<i32>, conductivity: f64, density: f64, specific_heat: f64) -> Self {
        Self::new(tags, conductivity, density * specific_heat)
    }

    /// Pennes bioheat material
    ///
    /// Perfusion acts as a sink `ρb·cb·ωb` pulling toward the arterial
    /// temperature, which together with metabolic heat forms the source.
    pub fn pennes(tags: Vec<i32>, p: &PennesParameters) -> Self {
        let sink = p.perfusion * p.blood_density * p.blood_specific_heat;
        Self {
            sink,
            source: sink * p.arterial_temperature + p.metabolic_heat,
            ..Self::heat(tags, p.conductivity, p.density, p.specific_heat)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_sink(mut self, sink: f64) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_source(mut self, source: f64) -> Self {
        self.source = source;
        self
    }

    pub fn with_relaxation_time(mut self, relaxation_time: f64) -> Self {
        self.relaxation_time = relaxation_time;
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Whether elements of this material carry a relaxation stub
    pub fn is_hyperbolic(&self) -> bool {
        self.relaxation_time > 0.0
    }

    /// Check that coefficients are finite and physically meaningful
    pub fn validate(&self) -> Result<()> {
        let label = if self.name.is_empty() {
            format!("material with tags {:?}", self.tags)
        } else {
            format!("material '{}'", self.name)
        };
        if self.tags.is_empty() {
            return Err(TlmError::config(format!("{label} declares no tag")));
        }
        let coefficients = [
            ("diffusion", self.diffusion),
            ("capacitance", self.capacitance),
            ("sink", self.sink),
            ("source", self.source),
            ("relaxation_time", self.relaxation_time),
        ];
        if let Some((name, _)) = coefficients.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TlmError::config(format!("{label}: {name} is not finite")));
        }
        if self.diffusion <= 0.0 {
            return Err(TlmError::config(format!("{label}: diffusion must be positive")));
        }
        if self.capacitance <= 0.0 {
            return Err(TlmError::config(format!("{label}: capacitance must be positive")));
        }
        if self.sink < 0.0 || self.relaxation_time < 0.0 {
            return Err(TlmError::config(format!(
                "{label}: sink and relaxation_time must not be negative"
            )));
        }
        Ok(())
    }
}
