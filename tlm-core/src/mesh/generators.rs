//! Structured mesh generators for common domains
//!
//! Every generator tags its domain elements with [`MATERIAL_TAG`] and adds
//! boundary elements (one dimension lower) on each side of the domain, tagged
//! with the side constants below.

use super::types::{ElementType, MeshTopology, Point};

/// Tag carried by domain elements
pub const MATERIAL_TAG: i32 = 1;
/// Tag of the boundary at `x = x_min`
pub const X_MIN_TAG: i32 = 10;
/// Tag of the boundary at `x = x_max`
pub const X_MAX_TAG: i32 = 11;
/// Tag of the boundary at `y = y_min`
pub const Y_MIN_TAG: i32 = 12;
/// Tag of the boundary at `y = y_max`
pub const Y_MAX_TAG: i32 = 13;
/// Tag of the boundary at `z = z_min`
pub const Z_MIN_TAG: i32 = 14;
/// Tag of the boundary at `z = z_max`
pub const Z_MAX_TAG: i32 = 15;

/// Generate a 1D bar of `n` line elements with point boundaries at both ends
pub fn line_mesh(x_min: f64, x_max: f64, n: usize) -> MeshTopology {
    let mut mesh = MeshTopology::new();
    let dx = (x_max - x_min) / n as f64;

    for i in 0..=n {
        mesh.add_node(Point::new_1d(x_min + i as f64 * dx));
    }
    for i in 0..n {
        mesh.add_element(ElementType::Line, &[i + 1, i + 2], MATERIAL_TAG);
    }

    mesh.add_element(ElementType::Point, &[1], X_MIN_TAG);
    mesh.add_element(ElementType::Point, &[n + 1], X_MAX_TAG);
    mesh
}

/// Generate a zig-zag strip of `n` triangles, each sharing one edge with the next
///
/// No boundary elements are added.
pub fn strip_triangles(n: usize) -> MeshTopology {
    let mut mesh = MeshTopology::new();

    for k in 0..n + 2 {
        mesh.add_node(Point::new_2d(0.5 * k as f64, (k % 2) as f64));
    }
    for i in 0..n {
        mesh.add_element(ElementType::Triangle, &[i + 1, i + 2, i + 3], MATERIAL_TAG);
    }
    mesh
}

/// Generate a rectangular mesh with triangular elements
pub fn rectangle_triangles(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    nx: usize,
    ny: usize,
) -> MeshTopology {
    let mut mesh = grid_nodes_2d(x_min, x_max, y_min, y_max, nx, ny);
    let node_id = |i: usize, j: usize| j * (nx + 1) + i + 1;

    // Two triangles per cell
    for j in 0..ny {
        for i in 0..nx {
            let n00 = node_id(i, j);
            let n10 = node_id(i + 1, j);
            let n01 = node_id(i, j + 1);
            let n11 = node_id(i + 1, j + 1);

            mesh.add_element(ElementType::Triangle, &[n00, n10, n11], MATERIAL_TAG);
            mesh.add_element(ElementType::Triangle, &[n00, n11, n01], MATERIAL_TAG);
        }
    }

    add_edge_boundaries(&mut mesh, nx, ny);
    mesh
}

/// Generate a rectangular mesh with quadrilateral elements
pub fn rectangle_quads(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    nx: usize,
    ny: usize,
) -> MeshTopology {
    let mut mesh = grid_nodes_2d(x_min, x_max, y_min, y_max, nx, ny);
    let node_id = |i: usize, j: usize| j * (nx + 1) + i + 1;

    for j in 0..ny {
        for i in 0..nx {
            let n00 = node_id(i, j);
            let n10 = node_id(i + 1, j);
            let n01 = node_id(i, j + 1);
            let n11 = node_id(i + 1, j + 1);

            mesh.add_element(ElementType::Quadrangle, &[n00, n10, n11, n01], MATERIAL_TAG);
        }
    }

    add_edge_boundaries(&mut mesh, nx, ny);
    mesh
}

/// Generate a box mesh with tetrahedral elements (6 per cell)
///
/// Boundary triangles follow the cell split: each boundary quad is cut along
/// the diagonal from its lowest to its highest corner.
#[allow(clippy::too_many_arguments)]
pub fn box_tetrahedra(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    z_min: f64,
    z_max: f64,
    nx: usize,
    ny: usize,
    nz: usize,
) -> MeshTopology {
    let mut mesh = grid_nodes_3d([x_min, x_max, y_min, y_max, z_min, z_max], nx, ny, nz);
    let node_id = |i: usize, j: usize, k: usize| k * (ny + 1) * (nx + 1) + j * (nx + 1) + i + 1;

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let n000 = node_id(i, j, k);
                let n100 = node_id(i + 1, j, k);
                let n010 = node_id(i, j + 1, k);
                let n110 = node_id(i + 1, j + 1, k);
                let n001 = node_id(i, j, k + 1);
                let n101 = node_id(i + 1, j, k + 1);
                let n011 = node_id(i, j + 1, k + 1);
                let n111 = node_id(i + 1, j + 1, k + 1);

                // Kuhn triangulation around the n000-n111 diagonal
                let tet = ElementType::Tetrahedron;
                mesh.add_element(tet, &[n000, n100, n110, n111], MATERIAL_TAG);
                mesh.add_element(tet, &[n000, n110, n010, n111], MATERIAL_TAG);
                mesh.add_element(tet, &[n000, n010, n011, n111], MATERIAL_TAG);
                mesh.add_element(tet, &[n000, n011, n001, n111], MATERIAL_TAG);
                mesh.add_element(tet, &[n000, n001, n101, n111], MATERIAL_TAG);
                mesh.add_element(tet, &[n000, n101, n100, n111], MATERIAL_TAG);
            }
        }
    }

    for (quad, tag) in boundary_quads(nx, ny, nz) {
        let [a, b, c, d] = quad;
        mesh.add_element(ElementType::Triangle, &[a, b, c], tag);
        mesh.add_element(ElementType::Triangle, &[a, c, d], tag);
    }
    mesh
}

/// Generate a box mesh with hexahedral elements and quadrangle boundaries
#[allow(clippy::too_many_arguments)]
pub fn box_hexahedra(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    z_min: f64,
    z_max: f64,
    nx: usize,
    ny: usize,
    nz: usize,
) -> MeshTopology {
    let mut mesh = grid_nodes_3d([x_min, x_max, y_min, y_max, z_min, z_max], nx, ny, nz);
    let node_id = |i: usize, j: usize, k: usize| k * (ny + 1) * (nx + 1) + j * (nx + 1) + i + 1;

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let n000 = node_id(i, j, k);
                let n100 = node_id(i + 1, j, k);
                let n010 = node_id(i, j + 1, k);
                let n110 = node_id(i + 1, j + 1, k);
                let n001 = node_id(i, j, k + 1);
                let n101 = node_id(i + 1, j, k + 1);
                let n011 = node_id(i, j + 1, k + 1);
                let n111 = node_id(i + 1, j + 1, k + 1);

                mesh.add_element(
                    ElementType::Hexahedron,
                    &[n000, n100, n110, n010, n001, n101, n111, n011],
                    MATERIAL_TAG,
                );
            }
        }
    }

    for (quad, tag) in boundary_quads(nx, ny, nz) {
        mesh.add_element(ElementType::Quadrangle, &quad, tag);
    }
    mesh
}

/// Generate a unit square mesh with triangles
pub fn unit_square_triangles(n: usize) -> MeshTopology {
    rectangle_triangles(0.0, 1.0, 0.0, 1.0, n, n)
}

/// Generate a unit cube mesh with tetrahedra
pub fn unit_cube_tetrahedra(n: usize) -> MeshTopology {
    box_tetrahedra(0.0, 1.0, 0.0, 1.0, 0.0, 1.0, n, n, n)
}

fn grid_nodes_2d(
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    nx: usize,
    ny: usize,
) -> MeshTopology {
    let mut mesh = MeshTopology::new();
    let dx = (x_max - x_min) / nx as f64;
    let dy = (y_max - y_min) / ny as f64;

    for j in 0..=ny {
        for i in 0..=nx {
            mesh.add_node(Point::new_2d(x_min + i as f64 * dx, y_min + j as f64 * dy));
        }
    }
    mesh
}

fn grid_nodes_3d(bounds: [f64; 6], nx: usize, ny: usize, nz: usize) -> MeshTopology {
    let [x_min, x_max, y_min, y_max, z_min, z_max] = bounds;
    let mut mesh = MeshTopology::new();
    let dx = (x_max - x_min) / nx as f64;
    let dy = (y_max - y_min) / ny as f64;
    let dz = (z_max - z_min) / nz as f64;

    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                mesh.add_node(Point::new_3d(
                    x_min + i as f64 * dx,
                    y_min + j as f64 * dy,
                    z_min + k as f64 * dz,
                ));
            }
        }
    }
    mesh
}

/// Line boundaries along the four sides of a structured 2D grid
fn add_edge_boundaries(mesh: &mut MeshTopology, nx: usize, ny: usize) {
    let node_id = |i: usize, j: usize| j * (nx + 1) + i + 1;

    for i in 0..nx {
        mesh.add_element(ElementType::Line, &[node_id(i, 0), node_id(i + 1, 0)], Y_MIN_TAG);
        mesh.add_element(ElementType::Line, &[node_id(i, ny), node_id(i + 1, ny)], Y_MAX_TAG);
    }
    for j in 0..ny {
        mesh.add_element(ElementType::Line, &[node_id(0, j), node_id(0, j + 1)], X_MIN_TAG);
        mesh.add_element(ElementType::Line, &[node_id(nx, j), node_id(nx, j + 1)], X_MAX_TAG);
    }
}

/// Boundary quads of a structured 3D grid, lowest corner first, highest third
fn boundary_quads(nx: usize, ny: usize, nz: usize) -> Vec<([usize; 4], i32)> {
    let node_id = |i: usize, j: usize, k: usize| k * (ny + 1) * (nx + 1) + j * (nx + 1) + i + 1;
    let mut quads = Vec::with_capacity(2 * (nx * ny + ny * nz + nx * nz));

    for (k, tag) in [(0, Z_MIN_TAG), (nz, Z_MAX_TAG)] {
        for j in 0..ny {
            for i in 0..nx {
                quads.push((
                    [
                        node_id(i, j, k),
                        node_id(i + 1, j, k),
                        node_id(i + 1, j + 1, k),
                        node_id(i, j + 1, k),
                    ],
                    tag,
                ));
            }
        }
    }
    for (j, tag) in [(0, Y_MIN_TAG), (ny, Y_MAX_TAG)] {
        for k in 0..nz {
            for i in 0..nx {
                quads.push((
                    [
                        node_id(i, j, k),
                        node_id(i + 1, j, k),
                        node_id(i + 1, j, k + 1),
                        node_id(i, j, k + 1),
                    ],
                    tag,
                ));
            }
        }
    }
    for (i, tag) in [(0, X_MIN_TAG), (nx, X_MAX_TAG)] {
        for k in 0..nz {
            for j in 0..ny {
                quads.push((
                    [
                        node_id(i, j, k),
                        node_id(i, j + 1, k),
                        node_id(i, j + 1, k + 1),
                        node_id(i, j, k + 1),
                    ],
                    tag,
                ));
            }
        }
    }
    quads
}
