//! Structural properties of assembled TLM systems
//!
//! These tests check numbering, intersection discovery, junction coefficients
//! and error reporting on small hand-checkable meshes.

use approx::assert_relative_eq;
use solvers::SparseBackend;
use tlm_core::assembly::build_index;
use tlm_core::config::{
    BetweenApproximation, BoundaryCondition, BoundarySpec, EquationConfig, MaterialSpec,
    OutputRequest,
};
use tlm_core::intersection::{AbstractPort, Member};
use tlm_core::mesh::{
    box_hexahedra, line_mesh, rectangle_quads, strip_triangles, unit_cube_tetrahedra, ElementId,
    ElementType, MeshTopology, Point, MATERIAL_TAG, X_MAX_TAG, X_MIN_TAG, Y_MAX_TAG, Y_MIN_TAG,
    Z_MAX_TAG, Z_MIN_TAG,
};
use tlm_core::output::OutputLabel;
use tlm_core::ports::PortAllocator;
use tlm_core::{assemble, GlobalSystem, TlmError};

fn diffusion() -> MaterialSpec {
    MaterialSpec::new(vec![MATERIAL_TAG], 1.0, 1.0)
}

fn adiabatic(tags: Vec<i32>) -> BoundarySpec {
    BoundarySpec::new(tags, BoundaryCondition::Adiabatic)
}

fn all_sides() -> Vec<i32> {
    vec![X_MIN_TAG, X_MAX_TAG, Y_MIN_TAG, Y_MAX_TAG, Z_MIN_TAG, Z_MAX_TAG]
}

fn row_sum(system: &GlobalSystem, row: usize) -> f64 {
    (0..system.layout.num_ports)
        .map(|col| system.scattering.get(row, col))
        .sum()
}

fn assert_uniform_state_preserved(system: &GlobalSystem) {
    let next = system.step(&system.initial_incident);
    for (a, b) in next.iter().zip(system.initial_incident.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-10);
    }
}

#[test]
fn test_isolated_line_element_with_adiabatic_ends() {
    let mesh = line_mesh(0.0, 2.0, 1);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]));
    let system = assemble(&mesh, &equation).unwrap();

    assert_eq!(system.layout.num_ports, 2);
    assert_relative_eq!(system.scattering.get(0, 0), system.scattering.get(1, 1));
    for row in 0..2 {
        assert_relative_eq!(row_sum(&system, row), 1.0, epsilon = 1e-12);
        assert_eq!(system.sources[row], 0.0);
    }
}

#[test]
fn test_triangle_strip_intersections() {
    let n = 6;
    let mesh = strip_triangles(n);
    let equation = EquationConfig::new(0.1).with_material(diffusion());
    let tags = equation.tag_table().unwrap();
    let allocator = PortAllocator::initiate(&mesh, &equation, &tags).unwrap();
    let index = build_index(&mesh, &allocator).unwrap();

    // Every distinct edge is one intersection
    assert_eq!(index.len(), 2 * n + 1);
    let shared = index.iter().filter(|(_, members)| members.len() == 2).count();
    assert_eq!(shared, n - 1);

    // No port is counted in two intersections
    let mut ports: Vec<usize> = index
        .iter()
        .flat_map(|(_, members)| members.iter())
        .filter_map(|m| match m {
            Member::Port(AbstractPort(p)) => Some(*p),
            Member::Boundary { .. } => None,
        })
        .collect();
    ports.sort_unstable();
    assert_eq!(ports, (0..3 * n).collect::<Vec<_>>());
}

#[test]
fn test_value_boundary_matched_line_has_zero_reflection() {
    // k = 1, c = 2, unit element and dt = 1 give R = Z = 0.5 on both ports
    let mesh = line_mesh(0.0, 1.0, 1);
    let equation = EquationConfig::new(1.0)
        .with_material(MaterialSpec::new(vec![MATERIAL_TAG], 1.0, 2.0))
        .with_boundary(BoundarySpec::new(vec![X_MIN_TAG], BoundaryCondition::Value { value: 4.0 }))
        .with_boundary(BoundarySpec::new(vec![X_MAX_TAG], BoundaryCondition::Value { value: 8.0 }));
    let system = assemble(&mesh, &equation).unwrap();

    for col in 0..2 {
        assert_eq!(system.scattering.get(0, col), 0.0);
        assert_eq!(system.scattering.get(1, col), 0.0);
    }
    assert_eq!(system.sources[0], 2.0);
    assert_eq!(system.sources[1], 4.0);
}

#[test]
fn test_single_material_without_boundaries_is_identity() {
    let mesh = strip_triangles(5);
    let equation = EquationConfig::new(0.1).with_material(diffusion());
    let tags = equation.tag_table().unwrap();
    let allocator = PortAllocator::initiate(&mesh, &equation, &tags).unwrap();

    assert_eq!(allocator.num_abstract_ports(), allocator.num_real_ports());
    for p in 0..allocator.num_abstract_ports() {
        assert_eq!(allocator.to_real(AbstractPort(p)), Some(p));
    }
}

#[test]
fn test_undeclared_tag_is_an_error() {
    let mesh = line_mesh(0.0, 1.0, 3);
    let equation = EquationConfig::new(0.1).with_material(diffusion());
    match assemble(&mesh, &equation) {
        Err(TlmError::UndefinedTag { tag, element }) => {
            assert_eq!(tag, X_MIN_TAG);
            assert_eq!(element, ElementId::new(ElementType::Point, 0));
        }
        other => panic!("expected UndefinedTag, got {other:?}"),
    }
}

#[test]
fn test_two_port_equal_impedances_transmit_symmetrically() {
    let mesh = line_mesh(0.0, 2.0, 2);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]));
    let system = assemble(&mesh, &equation).unwrap();
    let m = &system.scattering;

    // Ports 1 and 2 meet at x = 1
    assert_relative_eq!(m.get(1, 2), m.get(2, 1));
    assert_relative_eq!(m.get(1, 3), m.get(2, 0));
    assert_relative_eq!(m.get(1, 0), m.get(2, 3));
    for row in 0..4 {
        assert_relative_eq!(row_sum(&system, row), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_radiative_boundary_is_unimplemented() {
    let mesh = line_mesh(0.0, 1.0, 2);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG]))
        .with_boundary(BoundarySpec::new(
            vec![X_MAX_TAG],
            BoundaryCondition::Radiative {
                ambient: 300.0,
                emissivity: 0.9,
            },
        ));
    match assemble(&mesh, &equation) {
        Err(TlmError::UnimplementedBoundary { kind, tag, .. }) => {
            assert_eq!(kind, "radiative");
            assert_eq!(tag, X_MAX_TAG);
        }
        other => panic!("expected UnimplementedBoundary, got {other:?}"),
    }
}

/// Three triangles hinged on the edge (1, 2)
fn fan_mesh() -> MeshTopology {
    let mut mesh = MeshTopology::new();
    for p in [(0.0, 0.0), (1.0, 0.0), (0.5, 1.0), (0.5, -1.0), (0.2, 0.8)] {
        mesh.add_node(Point::new_2d(p.0, p.1));
    }
    for apex in [3, 4, 5] {
        mesh.add_element(ElementType::Triangle, &[1, 2, apex], MATERIAL_TAG);
    }
    mesh
}

#[test]
fn test_three_ports_on_one_face() {
    let mesh = fan_mesh();
    let strict = EquationConfig::new(0.1).with_material(diffusion());
    match assemble(&mesh, &strict) {
        Err(TlmError::UnsupportedTopology { vertices, .. }) => assert_eq!(vertices, vec![2, 1]),
        other => panic!("expected UnsupportedTopology, got {other:?}"),
    }

    let lenient = strict.with_strict_topology(false);
    let system = assemble(&mesh, &lenient).unwrap();
    // Port 0 of every triangle faces the shared edge and is left unstamped
    for element in 0..3 {
        assert_eq!(row_sum(&system, 3 * element), 0.0);
        assert_relative_eq!(row_sum(&system, 3 * element + 1), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_conflicting_boundaries_on_one_face() {
    let mut mesh = line_mesh(0.0, 1.0, 2);
    mesh.add_element(ElementType::Point, &[1], X_MAX_TAG);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG]))
        .with_boundary(BoundarySpec::new(vec![X_MAX_TAG], BoundaryCondition::Value { value: 1.0 }));
    assert!(matches!(
        assemble(&mesh, &equation),
        Err(TlmError::UnsupportedTopology { .. })
    ));
}

#[test]
fn test_hyperbolic_material_reserves_stubs() {
    let mesh = line_mesh(0.0, 1.0, 3);
    let equation = EquationConfig::new(1e-3)
        .with_material(diffusion().with_relaxation_time(0.01))
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]))
        .with_initial_value(2.0);
    let system = assemble(&mesh, &equation).unwrap();

    assert_eq!(system.layout.num_geometric_ports, 6);
    assert_eq!(system.layout.num_stubs, 3);
    assert_eq!(system.layout.num_ports, 9);
    for row in 0..9 {
        assert_relative_eq!(row_sum(&system, row), 1.0, epsilon = 1e-12);
    }
    // The stub row only couples ports of its own element
    assert_eq!(system.scattering.get(6, 2), 0.0);
    assert!(system.scattering.get(6, 0) > 0.0);
    assert_uniform_state_preserved(&system);
}

#[test]
fn test_time_step_too_large_for_relaxation() {
    let mesh = line_mesh(0.0, 1.0, 3);
    let equation = EquationConfig::new(10.0)
        .with_material(diffusion().with_relaxation_time(1e-4))
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]));
    assert!(matches!(assemble(&mesh, &equation), Err(TlmError::Configuration(_))));
}

#[test]
fn test_boundary_rank_selects_condition() {
    let mesh = line_mesh(0.0, 1.0, 1);
    let boundary =
        adiabatic(vec![X_MIN_TAG, X_MAX_TAG]).then(BoundaryCondition::Flux { flux: 2.0 });
    let mut equation = EquationConfig::new(0.1).with_material(diffusion()).with_boundary(boundary);

    let system = assemble(&mesh, &equation).unwrap();
    assert_eq!(system.sources[0], 0.0);

    equation.boundary_rank = 1;
    let system = assemble(&mesh, &equation).unwrap();
    assert!(system.sources[0] > 0.0);

    equation.boundary_rank = 2;
    assert!(matches!(assemble(&mesh, &equation), Err(TlmError::Configuration(_))));
}

#[test]
fn test_degenerate_and_missing_geometry() {
    let mut mesh = MeshTopology::new();
    for x in [0.0, 1.0, 2.0] {
        mesh.add_node(Point::new_2d(x, 0.0));
    }
    mesh.add_element(ElementType::Triangle, &[1, 2, 3], MATERIAL_TAG);
    let equation = EquationConfig::new(0.1).with_material(diffusion());
    assert!(matches!(
        assemble(&mesh, &equation),
        Err(TlmError::DegenerateGeometry { .. })
    ));

    let mut mesh = MeshTopology::new();
    mesh.add_node(Point::new_1d(0.0));
    mesh.add_element(ElementType::Line, &[1, 9], MATERIAL_TAG);
    assert!(matches!(
        assemble(&mesh, &equation),
        Err(TlmError::MissingNode { node: 9, .. })
    ));
}

#[test]
fn test_output_rows_and_labels() {
    let mesh = rectangle_quads(0.0, 1.0, 0.0, 1.0, 2, 2);
    let equation = EquationConfig::new(0.01)
        .with_material(diffusion())
        .with_boundary(adiabatic(all_sides()))
        .with_outputs(OutputRequest::all(BetweenApproximation::FromReflected));
    let system = assemble(&mesh, &equation).unwrap();

    // 4 centres, then 12 faces (4 interior, 8 boundary) for each of between and flux
    let labels = &system.layout.outputs;
    assert_eq!(labels.len(), 4 + 2 * 12);
    assert_eq!(system.output_scattering.rows(), labels.len());
    assert!(labels[..4].iter().all(|l| matches!(l, OutputLabel::NodeCenter { .. })));
    assert!(labels[4..16].iter().all(|l| matches!(l, OutputLabel::Between { .. })));
    assert!(labels[16..].iter().all(|l| matches!(l, OutputLabel::Flux { .. })));
    let interior = labels[16..]
        .iter()
        .filter(|l| matches!(l, OutputLabel::Flux { neighbour: Some(_), .. }))
        .count();
    assert_eq!(interior, 4);

    // A uniform state reads back the initial value everywhere, with zero flux
    let equation = equation.with_initial_value(5.0);
    let system = assemble(&mesh, &equation).unwrap();
    let outputs = system.outputs(&system.initial_incident);
    for (label, value) in system.layout.outputs.iter().zip(outputs.iter()) {
        let expected = match label {
            OutputLabel::Flux { .. } => 0.0,
            _ => 5.0,
        };
        assert_relative_eq!(*value, expected, epsilon = 1e-10);
    }
}

#[test]
fn test_three_dimensional_meshes() {
    let tets = unit_cube_tetrahedra(1);
    let equation = EquationConfig::new(0.01)
        .with_material(diffusion())
        .with_boundary(adiabatic(all_sides()))
        .with_initial_value(1.0);
    let system = assemble(&tets, &equation).unwrap();
    assert_eq!(system.layout.num_ports, 24);
    // 6 interior faces, 12 boundary triangles
    assert_eq!(system.layout.num_intersections, 18);
    assert_uniform_state_preserved(&system);

    let hexes = box_hexahedra(0.0, 2.0, 0.0, 1.0, 0.0, 1.0, 2, 1, 1);
    let system = assemble(&hexes, &equation).unwrap();
    assert_eq!(system.layout.num_ports, 12);
    assert_eq!(system.layout.num_intersections, 11);
    assert_uniform_state_preserved(&system);
}

#[test]
fn test_prism_beside_pyramid() {
    let mut mesh = MeshTopology::new();
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.5, 0.5, -1.0),
        (0.0, 0.0, 1.0),
        (1.0, 0.0, 1.0),
        (1.0, 1.0, 1.0),
    ];
    for p in points {
        mesh.add_node(Point::from(p));
    }
    // Pyramid below the square z = 0, prism above its triangle (1, 2, 3)
    mesh.add_element(ElementType::Pyramid, &[1, 2, 3, 4, 5], MATERIAL_TAG);
    mesh.add_element(ElementType::Prism, &[1, 2, 3, 6, 7, 8], MATERIAL_TAG);
    let equation = EquationConfig::new(0.01)
        .with_material(diffusion())
        .with_initial_value(2.0);
    let system = assemble(&mesh, &equation).unwrap();

    assert_eq!(system.layout.num_ports, 10);
    // The pyramid base and the prism bottom have different vertex sets
    assert_eq!(system.layout.num_intersections, 10);
    assert_uniform_state_preserved(&system);
}

#[test]
fn test_zero_film_coefficient_is_rejected_before_assembly() {
    let mesh = line_mesh(0.0, 1.0, 2);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG]))
        .with_boundary(BoundarySpec::new(
            vec![X_MAX_TAG],
            BoundaryCondition::Convective {
                ambient: 1.0,
                coefficient: 0.0,
            },
        ));
    assert!(matches!(equation.validate(), Err(TlmError::Configuration(_))));
    assert!(matches!(assemble(&mesh, &equation), Err(TlmError::Configuration(_))));

    let mut equation = equation;
    equation.boundaries[1].conditions[0] = BoundaryCondition::Value { value: f64::NAN };
    assert!(matches!(assemble(&mesh, &equation), Err(TlmError::Configuration(_))));
}

#[test]
fn test_ragged_element_array_is_an_error() {
    let mut mesh = line_mesh(0.0, 1.0, 2);
    let lines = mesh
        .elements
        .iter_mut()
        .find(|a| a.element_type == ElementType::Line)
        .unwrap();
    lines.tags.push(MATERIAL_TAG);
    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]));
    match assemble(&mesh, &equation) {
        Err(TlmError::Configuration(message)) => assert!(message.contains("line")),
        other => panic!("expected Configuration, got {other:?}"),
    }
}

#[test]
fn test_second_array_of_one_type_is_an_error() {
    let mut mesh = line_mesh(0.0, 1.0, 2);
    mesh.add_node(Point::new_1d(1.5));
    let mut extra = tlm_core::mesh::ElementArray::new(ElementType::Line);
    extra.connectivity.extend([3, 4]);
    extra.tags.push(MATERIAL_TAG);
    mesh.elements.push(extra);

    let equation = EquationConfig::new(0.1)
        .with_material(diffusion())
        .with_boundary(adiabatic(vec![X_MIN_TAG, X_MAX_TAG]));
    assert!(matches!(assemble(&mesh, &equation), Err(TlmError::Configuration(_))));
}
