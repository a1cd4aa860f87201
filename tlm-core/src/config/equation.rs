//! Per-equation configuration and tag resolution

use super::boundary::BoundarySpec;
use super::material::MaterialSpec;
use crate::error::{Result, TlmError};
use crate::mesh::MeshTopology;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// How the scalar between two element centres is approximated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetweenApproximation {
    /// From the reflected voltages of the link lines
    #[default]
    FromReflected,
    /// Resistive interpolation of the node-centre scalars
    FromNodeCenter,
}

/// Which auxiliary output rows to assemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputRequest {
    /// One scalar per material element centre
    #[serde(default)]
    pub node_center: bool,
    /// One scalar per intersection with a material port
    #[serde(default)]
    pub between: bool,
    /// One flux density per intersection with a material port
    #[serde(default)]
    pub flux: bool,
    #[serde(default)]
    pub approximation: BetweenApproximation,
}

impl OutputRequest {
    /// Every output kind with the given approximation
    pub fn all(approximation: BetweenApproximation) -> Self {
        Self {
            node_center: true,
            between: true,
            flux: true,
            approximation,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.node_center || self.between || self.flux)
    }
}

/// Everything the assembly needs besides the mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationConfig {
    /// Time step Δt
    pub time_step: f64,
    pub materials: Vec<MaterialSpec>,
    #[serde(default)]
    pub boundaries: Vec<BoundarySpec>,
    #[serde(default)]
    pub outputs: OutputRequest,
    /// Initial scalar for materials that do not set their own
    #[serde(default)]
    pub initial_value: f64,
    /// Index into every boundary's ranked condition list
    #[serde(default)]
    pub boundary_rank: usize,
    /// Fail on intersections shared by more than two material ports
    #[serde(default = "default_strict_topology")]
    pub strict_topology: bool,
}

fn default_strict_topology() -> bool {
    true
}

impl EquationConfig {
    pub fn new(time_step: f64) -> Self {
        Self {
            time_step,
            materials: Vec::new(),
            boundaries: Vec::new(),
            outputs: OutputRequest::default(),
            initial_value: 0.0,
            boundary_rank: 0,
            strict_topology: true,
        }
    }

    pub fn with_material(mut self, material: MaterialSpec) -> Self {
        self.materials.push(material);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundarySpec) -> Self {
        self.boundaries.push(boundary);
        self
    }

    pub fn with_outputs(mut self, outputs: OutputRequest) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    pub fn with_strict_topology(mut self, strict: bool) -> Self {
        self.strict_topology = strict;
        self
    }

    /// Check coefficients, the boundary rank and the time step
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(TlmError::config(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        if self.materials.is_empty() {
            return Err(TlmError::config("no material declared"));
        }
        if !self.initial_value.is_finite() {
            return Err(TlmError::config("initial value is not finite"));
        }
        for material in &self.materials {
            material.validate()?;
        }
        for boundary in &self.boundaries {
            if boundary.tags.is_empty() {
                return Err(TlmError::config("boundary declares no tag"));
            }
            boundary.condition(self.boundary_rank)?.validate()?;
        }
        Ok(())
    }

    /// Build the tag lookup table
    pub fn tag_table(&self) -> Result<TagTable> {
        TagTable::new(self)
    }

    /// Initial scalar of a material
    pub fn initial_value_of(&self, material: usize) -> f64 {
        self.materials[material]
            .initial_value
            .unwrap_or(self.initial_value)
    }

    /// Load configuration from JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EquationConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// What an element tag selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Index into [`EquationConfig::materials`]
    Material(usize),
    /// Index into [`EquationConfig::boundaries`]
    Boundary(usize),
}

/// Tag → material/boundary lookup
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    classes: HashMap<i32, TagClass>,
}

impl TagTable {
    /// Index every declared tag; a tag declared twice is a configuration error
    pub fn new(config: &EquationConfig) -> Result<Self> {
        let mut classes = HashMap::new();
        let materials = config
            .materials
            .iter()
            .enumerate()
            .flat_map(|(i, m)| m.tags.iter().map(move |&t| (t, TagClass::Material(i))));
        let boundaries = config
            .boundaries
            .iter()
            .enumerate()
            .flat_map(|(i, b)| b.tags.iter().map(move |&t| (t, TagClass::Boundary(i))));

        for (tag, class) in materials.chain(boundaries) {
            if let Some(previous) = classes.insert(tag, class) {
                return Err(TlmError::config(format!(
                    "tag {tag} declared twice ({previous:?} and {class:?})"
                )));
            }
        }
        Ok(Self { classes })
    }

    pub fn resolve(&self, tag: i32) -> Option<TagClass> {
        self.classes.get(&tag).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// A mesh and its equation in one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
    pub mesh: MeshTopology,
    pub equation: EquationConfig,
}

impl CaseFile {
    /// Load a case from JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save the case to JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
