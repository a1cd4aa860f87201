//! Boundary conditions
//!
//! On disk a condition is an untyped `{"type": ..., "data": [...]}` pair; it is
//! validated into [`BoundaryCondition`] when deserialized, so the data arity is
//! checked before assembly starts.

use crate::error::{Result, TlmError};
use serde::{Deserialize, Serialize};

/// Untyped `(type, data[])` pair as written in configuration files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBoundary {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<f64>,
}

/// Boundary condition applied to the port facing a boundary element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundary", into = "RawBoundary")]
pub enum BoundaryCondition {
    /// Zero flux
    Adiabatic,
    /// Prescribed scalar on the boundary
    Value { value: f64 },
    /// Prescribed inward flux density
    Flux { flux: f64 },
    /// Exchange with an ambient scalar through a film coefficient
    Convective { ambient: f64, coefficient: f64 },
    /// Declared but not implemented by the assembly engine
    Radiative { ambient: f64, emissivity: f64 },
}

impl BoundaryCondition {
    pub fn kind(&self) -> &'static str {
        match self {
            BoundaryCondition::Adiabatic => "adiabatic",
            BoundaryCondition::Value { .. } => "value",
            BoundaryCondition::Flux { .. } => "flux",
            BoundaryCondition::Convective { .. } => "convective",
            BoundaryCondition::Radiative { .. } => "radiative",
        }
    }

    /// Reject non-finite data and non-positive film coefficients
    pub fn validate(&self) -> Result<()> {
        let data = RawBoundary::from(*self).data;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(TlmError::config(format!(
                "{} boundary has non-finite data {data:?}",
                self.kind()
            )));
        }
        if let BoundaryCondition::Convective { coefficient, .. } = *self {
            if coefficient <= 0.0 {
                return Err(TlmError::config(format!(
                    "convective boundary needs a positive film coefficient, got {coefficient}"
                )));
            }
        }
        Ok(())
    }

    fn arity(kind: &str) -> Option<usize> {
        match kind {
            "adiabatic" => Some(0),
            "value" | "flux" => Some(1),
            "convective" | "radiative" => Some(2),
            _ => None,
        }
    }
}

impl TryFrom<RawBoundary> for BoundaryCondition {
    type Error = TlmError;

    fn try_from(raw: RawBoundary) -> Result<Self> {
        let kind = raw.kind.to_ascii_lowercase();
        let expected = Self::arity(&kind)
            .ok_or_else(|| TlmError::config(format!("unknown boundary type '{}'", raw.kind)))?;
        if raw.data.len() != expected {
            return Err(TlmError::config(format!(
                "boundary type '{kind}' expects {expected} data values, got {}",
                raw.data.len()
            )));
        }
        let d = &raw.data;
        let condition = match kind.as_str() {
            "adiabatic" => BoundaryCondition::Adiabatic,
            "value" => BoundaryCondition::Value { value: d[0] },
            "flux" => BoundaryCondition::Flux { flux: d[0] },
            "convective" => BoundaryCondition::Convective {
                ambient: d[0],
                coefficient: d[1],
            },
            _ => BoundaryCondition::Radiative {
                ambient: d[0],
                emissivity: d[1],
            },
        };
        condition.validate()?;
        Ok(condition)
    }
}

impl From<BoundaryCondition> for RawBoundary {
    fn from(condition: BoundaryCondition) -> Self {
        let data = match condition {
            BoundaryCondition::Adiabatic => vec![],
            BoundaryCondition::Value { value } => vec![value],
            BoundaryCondition::Flux { flux } => vec![flux],
            BoundaryCondition::Convective {
                ambient,
                coefficient,
            } => vec![ambient, coefficient],
            BoundaryCondition::Radiative {
                ambient,
                emissivity,
            } => vec![ambient, emissivity],
        };
        RawBoundary {
            kind: condition.kind().to_string(),
            data,
        }
    }
}

/// A boundary region: element tags plus a ranked list of conditions
///
/// The rank selects the condition used by a given equation, so one boundary
/// table can serve several coupled equations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundarySpec {
    #[serde(default)]
    pub name: String,
    pub tags: Vec<i32>,
    pub conditions: Vec<BoundaryCondition>,
}

impl BoundarySpec {
    /// Boundary with a single condition
    pub fn new(tags: Vec<i32>, condition: BoundaryCondition) -> Self {
        Self {
            name: String::new(),
            tags,
            conditions: vec![condition],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a condition of the next rank
    pub fn then(mut self, condition: BoundaryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Condition of the given rank
    pub fn condition(&self, rank: usize) -> Result<&BoundaryCondition> {
        self.conditions.get(rank).ok_or_else(|| {
            TlmError::config(format!(
                "boundary with tags {:?} has {} condition(s), rank {rank} requested",
                self.tags,
                self.conditions.len()
            ))
        })
    }
}
