//! Error kinds raised while configuring and assembling a TLM system
//!
//! Every failure aborts the whole assembly; there is no local recovery path.
//! Variants carry the tag, element or intersection needed to diagnose the input.

use crate::mesh::ElementId;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = TlmError> = std::result::Result<T, E>;

/// Closed set of assembly failures
#[derive(Debug, Error)]
pub enum TlmError {
    /// A buffer could not be grown
    #[error("failed to allocate {requested} entries for {what}")]
    Allocation {
        what: &'static str,
        requested: usize,
    },

    /// An element carries a tag that no material or boundary declares
    #[error("element {element} has tag {tag}, which matches no declared material or boundary")]
    UndefinedTag { tag: i32, element: ElementId },

    /// Inconsistent or incomplete equation configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Mesh topology the junction archetypes cannot express
    #[error("unsupported topology at intersection {intersection} {vertices:?}: {reason}")]
    UnsupportedTopology {
        intersection: usize,
        vertices: Vec<usize>,
        reason: String,
    },

    /// A declared boundary type without an implementation
    #[error("boundary '{kind}' (tag {tag}) at intersection {intersection} is not implemented")]
    UnimplementedBoundary {
        kind: &'static str,
        tag: i32,
        intersection: usize,
    },

    /// Zero-length port, zero-measure face or collapsed element
    #[error("degenerate geometry in element {element}: {reason}")]
    DegenerateGeometry { element: ElementId, reason: String },

    /// The mesh references a node that does not exist
    #[error("element {element} references node {node}, but the mesh has {node_count} nodes")]
    MissingNode {
        element: ElementId,
        node: usize,
        node_count: usize,
    },

    #[error(transparent)]
    Solver(#[from] solvers::SolverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TlmError {
    /// Shorthand for [`TlmError::Configuration`]
    pub fn config(message: impl Into<String>) -> Self {
        TlmError::Configuration(message.into())
    }
}
