//! Per-port geometry of an element seen from its centroid

use crate::error::{Result, TlmError};
use crate::mesh::{ElementId, Point};
use smallvec::SmallVec;

/// Relative tolerance below which a length, area or volume counts as zero
const DEGENERACY_TOLERANCE: f64 = 1e-10;

/// Geometry of one port
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortGeometry {
    /// Perpendicular distance from the centroid to the face `d_p`
    pub distance: f64,
    /// Face area, edge length, or 1 for a vertex `L_p`
    pub face_measure: f64,
}

/// Centroid, per-port geometry and measure of an element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementGeometry {
    pub centroid: Point,
    pub ports: SmallVec<[PortGeometry; 6]>,
    /// Length, area or volume
    pub measure: f64,
    pub dimension: usize,
}

/// Newell normal of a polygon: twice the area times the unit normal
fn newell_normal(points: &[Point]) -> Point {
    let n = points.len();
    (0..n).fold(Point::default(), |acc, i| {
        acc + points[i].cross(&points[(i + 1) % n])
    })
}

/// Distance from `point` to the face spanned by `face`, and the face measure
fn port_geometry(point: &Point, face: &[Point]) -> PortGeometry {
    match face {
        [vertex] => PortGeometry {
            distance: point.distance(vertex),
            face_measure: 1.0,
        },
        [a, b] => {
            let edge = *b - *a;
            let length = edge.norm();
            let distance = if length > 0.0 {
                edge.cross(&(*point - *a)).norm() / length
            } else {
                0.0
            };
            PortGeometry {
                distance,
                face_measure: length,
            }
        }
        _ => {
            let normal = newell_normal(face);
            let twice_area = normal.norm();
            let distance = if twice_area > 0.0 {
                let center = Point::centroid(face);
                (*point - center).dot(&normal).abs() / twice_area
            } else {
                0.0
            };
            PortGeometry {
                distance,
                face_measure: 0.5 * twice_area,
            }
        }
    }
}

impl ElementGeometry {
    /// Compute the geometry of an element from its vertex coordinates
    pub fn new(element: ElementId, vertices: &[Point]) -> Result<Self> {
        let element_type = element.element_type;
        let dimension = element_type.dimension();
        if dimension == 0 {
            return Err(TlmError::config(format!("{element} has no ports")));
        }

        let centroid = Point::centroid(vertices);
        let size = vertices
            .iter()
            .map(|v| v.distance(&centroid))
            .fold(0.0, f64::max);
        let degenerate = |reason: String| TlmError::DegenerateGeometry { element, reason };
        if !(size > 0.0) {
            return Err(degenerate("all vertices coincide".to_string()));
        }

        let mut ports = SmallVec::new();
        let mut face = SmallVec::<[Point; 4]>::new();
        for (p, local) in element_type.faces().iter().enumerate() {
            face.clear();
            face.extend(local.iter().map(|&v| vertices[v]));
            let port = port_geometry(&centroid, &face);

            if !(port.distance > DEGENERACY_TOLERANCE * size) {
                return Err(degenerate(format!(
                    "port {p} is at distance {:e} from the centroid",
                    port.distance
                )));
            }
            let face_scale = size.powi(dimension as i32 - 1);
            if !(port.face_measure > DEGENERACY_TOLERANCE * face_scale) {
                return Err(degenerate(format!(
                    "face of port {p} has measure {:e}",
                    port.face_measure
                )));
            }
            ports.push(port);
        }

        let measure = ports
            .iter()
            .map(|p: &PortGeometry| p.face_measure * p.distance)
            .sum::<f64>()
            / dimension as f64;
        if !(measure > DEGENERACY_TOLERANCE * size.powi(dimension as i32)) {
            return Err(degenerate(format!("measure {measure:e}")));
        }

        Ok(Self {
            centroid,
            ports,
            measure,
            dimension,
        })
    }

    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ElementType;
    use approx::assert_relative_eq;

    fn id(element_type: ElementType) -> ElementId {
        ElementId::new(element_type, 0)
    }

    #[test]
    fn test_line() {
        let v = [Point::new_1d(1.0), Point::new_1d(3.0)];
        let g = ElementGeometry::new(id(ElementType::Line), &v).unwrap();
        assert_relative_eq!(g.measure, 2.0);
        assert_relative_eq!(g.ports[0].distance, 1.0);
        assert_relative_eq!(g.ports[1].face_measure, 1.0);
    }

    #[test]
    fn test_right_triangle() {
        let v = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(3.0, 0.0),
            Point::new_2d(0.0, 3.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Triangle), &v).unwrap();
        assert_relative_eq!(g.measure, 4.5, epsilon = 1e-12);
        // Edge (v0, v1) lies on y = 0, centroid at (1, 1)
        assert_relative_eq!(g.ports[0].distance, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.ports[0].face_measure, 3.0);
        assert_relative_eq!(g.ports[1].face_measure, 18f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_unit_square() {
        let v = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(1.0, 0.0),
            Point::new_2d(1.0, 1.0),
            Point::new_2d(0.0, 1.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Quadrangle), &v).unwrap();
        assert_relative_eq!(g.measure, 1.0, epsilon = 1e-12);
        for port in &g.ports {
            assert_relative_eq!(port.distance, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unit_tetrahedron() {
        let v = [
            Point::new_3d(0.0, 0.0, 0.0),
            Point::new_3d(1.0, 0.0, 0.0),
            Point::new_3d(0.0, 1.0, 0.0),
            Point::new_3d(0.0, 0.0, 1.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Tetrahedron), &v).unwrap();
        assert_relative_eq!(g.measure, 1.0 / 6.0, epsilon = 1e-12);
        // Port 3 faces z = 0
        assert_relative_eq!(g.ports[3].distance, 0.25, epsilon = 1e-12);
        assert_relative_eq!(g.ports[3].face_measure, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_solids_measure() {
        let cube = [
            Point::new_3d(0.0, 0.0, 0.0),
            Point::new_3d(2.0, 0.0, 0.0),
            Point::new_3d(2.0, 1.0, 0.0),
            Point::new_3d(0.0, 1.0, 0.0),
            Point::new_3d(0.0, 0.0, 1.0),
            Point::new_3d(2.0, 0.0, 1.0),
            Point::new_3d(2.0, 1.0, 1.0),
            Point::new_3d(0.0, 1.0, 1.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Hexahedron), &cube).unwrap();
        assert_relative_eq!(g.measure, 2.0, epsilon = 1e-12);
        assert_relative_eq!(g.ports[3].distance, 1.0, epsilon = 1e-12);

        let prism = [
            Point::new_3d(0.0, 0.0, 0.0),
            Point::new_3d(1.0, 0.0, 0.0),
            Point::new_3d(0.0, 1.0, 0.0),
            Point::new_3d(0.0, 0.0, 2.0),
            Point::new_3d(1.0, 0.0, 2.0),
            Point::new_3d(0.0, 1.0, 2.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Prism), &prism).unwrap();
        assert_relative_eq!(g.measure, 1.0, epsilon = 1e-12);

        let pyramid = [
            Point::new_3d(0.0, 0.0, 0.0),
            Point::new_3d(1.0, 0.0, 0.0),
            Point::new_3d(1.0, 1.0, 0.0),
            Point::new_3d(0.0, 1.0, 0.0),
            Point::new_3d(0.5, 0.5, 3.0),
        ];
        let g = ElementGeometry::new(id(ElementType::Pyramid), &pyramid).unwrap();
        assert_relative_eq!(g.measure, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_triangle() {
        let v = [
            Point::new_2d(0.0, 0.0),
            Point::new_2d(1.0, 0.0),
            Point::new_2d(2.0, 0.0),
        ];
        let err = ElementGeometry::new(id(ElementType::Triangle), &v).unwrap_err();
        assert!(matches!(err, TlmError::DegenerateGeometry { .. }));
    }
}
