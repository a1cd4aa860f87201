//! Mesh topology handed to the assembly engine
//!
//! Nodes carry 1-based identities; elements are stored in one array per
//! element type, each element with its ordered vertices and an integer tag that
//! selects a material or a boundary specification. Vertex ordering follows the
//! Gmsh convention.

use crate::error::{Result, TlmError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A point in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    /// Create a 1D point (y = z = 0)
    pub fn new_1d(x: f64) -> Self {
        Self { x, y: 0.0, z: 0.0 }
    }

    /// Create a 2D point (z = 0)
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Create a 3D point
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point) -> Point {
        Point::new_3d(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean norm of the position vector
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).norm()
    }

    /// Arithmetic mean of a set of points
    pub fn centroid(points: &[Point]) -> Point {
        let n = points.len().max(1) as f64;
        let sum = points
            .iter()
            .fold(Point::default(), |acc, p| acc + *p);
        sum * (1.0 / n)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new_3d(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new_3d(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new_3d(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from(p: (f64, f64, f64)) -> Self {
        Point::new_3d(p.0, p.1, p.2)
    }
}

const POINT_FACES: [&[usize]; 0] = [];
const LINE_FACES: [&[usize]; 2] = [&[0], &[1]];
const TRIANGLE_FACES: [&[usize]; 3] = [&[0, 1], &[1, 2], &[2, 0]];
const QUADRANGLE_FACES: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TETRAHEDRON_FACES: [&[usize]; 4] = [&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
const HEXAHEDRON_FACES: [&[usize]; 6] = [
    &[0, 1, 2, 3], // Bottom
    &[4, 5, 6, 7], // Top
    &[0, 1, 5, 4], // Front
    &[1, 2, 6, 5], // Right
    &[2, 3, 7, 6], // Back
    &[3, 0, 4, 7], // Left
];
const PRISM_FACES: [&[usize]; 5] = [
    &[0, 1, 2],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];
const PYRAMID_FACES: [&[usize]; 5] = [
    &[0, 1, 2, 3],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

/// Element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Point,
    Line,
    Triangle,
    Quadrangle,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl ElementType {
    /// Every element type, in the order elements are scanned during numbering
    pub const ALL: [ElementType; 8] = [
        ElementType::Point,
        ElementType::Line,
        ElementType::Triangle,
        ElementType::Quadrangle,
        ElementType::Tetrahedron,
        ElementType::Hexahedron,
        ElementType::Prism,
        ElementType::Pyramid,
    ];

    /// Number of vertices (corners) for this element type
    pub fn num_vertices(&self) -> usize {
        match self {
            ElementType::Point => 1,
            ElementType::Line => 2,
            ElementType::Triangle => 3,
            ElementType::Quadrangle => 4,
            ElementType::Tetrahedron => 4,
            ElementType::Hexahedron => 8,
            ElementType::Prism => 6,
            ElementType::Pyramid => 5,
        }
    }

    /// Spatial dimension of this element
    pub fn dimension(&self) -> usize {
        match self {
            ElementType::Point => 0,
            ElementType::Line => 1,
            ElementType::Triangle | ElementType::Quadrangle => 2,
            ElementType::Tetrahedron
            | ElementType::Hexahedron
            | ElementType::Prism
            | ElementType::Pyramid => 3,
        }
    }

    /// Local vertex lists of the faces (3D), edges (2D) or end points (1D)
    ///
    /// Face `i` is the one port `i` looks at; polygon faces are listed in
    /// cyclic order.
    pub fn faces(&self) -> &'static [&'static [usize]] {
        match self {
            ElementType::Point => &POINT_FACES,
            ElementType::Line => &LINE_FACES,
            ElementType::Triangle => &TRIANGLE_FACES,
            ElementType::Quadrangle => &QUADRANGLE_FACES,
            ElementType::Tetrahedron => &TETRAHEDRON_FACES,
            ElementType::Hexahedron => &HEXAHEDRON_FACES,
            ElementType::Prism => &PRISM_FACES,
            ElementType::Pyramid => &PYRAMID_FACES,
        }
    }

    /// Number of transmission-line ports (one per face)
    pub fn num_ports(&self) -> usize {
        self.faces().len()
    }

    /// Whether at least one face has four vertices
    pub fn has_quad_faces(&self) -> bool {
        self.faces().iter().any(|f| f.len() == 4)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Point => "point",
            ElementType::Line => "line",
            ElementType::Triangle => "triangle",
            ElementType::Quadrangle => "quadrangle",
            ElementType::Tetrahedron => "tetrahedron",
            ElementType::Hexahedron => "hexahedron",
            ElementType::Prism => "prism",
            ElementType::Pyramid => "pyramid",
        }
    }
}

/// Identity of an element: its type and position in that type's array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId {
    pub element_type: ElementType,
    pub index: usize,
}

impl ElementId {
    pub fn new(element_type: ElementType, index: usize) -> Self {
        Self {
            element_type,
            index,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.element_type.name(), self.index)
    }
}

/// All elements of one type: flat connectivity plus one tag per element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementArray {
    pub element_type: ElementType,
    /// 1-based node ids, `num_vertices` per element
    pub connectivity: Vec<usize>,
    pub tags: Vec<i32>,
}

impl ElementArray {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            connectivity: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Vertex node ids of element `index`
    pub fn vertices(&self, index: usize) -> &[usize] {
        let n = self.element_type.num_vertices();
        &self.connectivity[index * n..(index + 1) * n]
    }

    pub fn tag(&self, index: usize) -> i32 {
        self.tags[index]
    }
}

/// Nodes plus typed, tagged element arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshTopology {
    /// Node coordinates; node id `i` lives at `nodes[i - 1]`
    pub nodes: Vec<Point>,
    /// Element arrays, at most one per element type
    pub elements: Vec<ElementArray>,
}

impl MeshTopology {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its 1-based id
    pub fn add_node(&mut self, point: Point) -> usize {
        self.nodes.push(point);
        self.nodes.len()
    }

    /// Add an element from 1-based node ids
    ///
    /// # Panics
    ///
    /// Panics if the vertex count does not match the element type.
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        nodes: &[usize],
        tag: i32,
    ) -> ElementId {
        assert_eq!(
            nodes.len(),
            element_type.num_vertices(),
            "{} needs {} vertices",
            element_type.name(),
            element_type.num_vertices()
        );
        let array = match self.elements.iter().position(|a| a.element_type == element_type) {
            Some(pos) => &mut self.elements[pos],
            None => {
                self.elements.push(ElementArray::new(element_type));
                self.elements.sort_by_key(|a| a.element_type);
                let pos = self
                    .elements
                    .iter()
                    .position(|a| a.element_type == element_type)
                    .unwrap_or(self.elements.len() - 1);
                &mut self.elements[pos]
            }
        };
        array.connectivity.extend_from_slice(nodes);
        array.tags.push(tag);
        ElementId::new(element_type, array.len() - 1)
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements over all types
    pub fn num_elements(&self) -> usize {
        self.elements.iter().map(ElementArray::len).sum()
    }

    /// Coordinates of node `id` (1-based)
    pub fn node(&self, id: usize) -> Option<&Point> {
        id.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// The element array of a given type, if any element of that type exists
    pub fn elements_of(&self, element_type: ElementType) -> Option<&ElementArray> {
        self.elements
            .iter()
            .find(|a| a.element_type == element_type && !a.is_empty())
    }

    /// Highest element dimension present: the dimension of the simulated domain
    pub fn dimension(&self) -> usize {
        self.elements
            .iter()
            .filter(|a| !a.is_empty())
            .map(|a| a.element_type.dimension())
            .max()
            .unwrap_or(0)
    }

    /// Check that every element array is consistent and that no type has two arrays
    ///
    /// Meshes built through [`MeshTopology::add_element`] always pass; this
    /// guards meshes deserialized from case files.
    pub fn validate(&self) -> Result<()> {
        for (i, array) in self.elements.iter().enumerate() {
            let name = array.element_type.name();
            let expected = array.tags.len() * array.element_type.num_vertices();
            if array.connectivity.len() != expected {
                return Err(TlmError::config(format!(
                    "{name} array has {} tags but {} connectivity entries (expected {expected})",
                    array.tags.len(),
                    array.connectivity.len()
                )));
            }
            if self.elements[..i]
                .iter()
                .any(|other| other.element_type == array.element_type)
            {
                return Err(TlmError::config(format!(
                    "mesh holds more than one {name} array"
                )));
            }
        }
        Ok(())
    }

    /// Coordinates of the vertices of an element
    pub fn vertex_coords(&self, id: ElementId) -> Result<SmallVec<[Point; 8]>> {
        let array = self.elements_of(id.element_type).ok_or_else(|| {
            TlmError::config(format!("mesh has no element {id}"))
        })?;
        array
            .vertices(id.index)
            .iter()
            .map(|&node| {
                self.node(node).copied().ok_or(TlmError::MissingNode {
                    element: id,
                    node,
                    node_count: self.nodes.len(),
                })
            })
            .collect()
    }
}
