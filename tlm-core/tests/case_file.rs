//! Loading cases from JSON and assembling them

use approx::assert_relative_eq;
use solvers::SparseBackend;
use tlm_core::config::{BoundaryCondition, BoundarySpec, CaseFile, EquationConfig, MaterialSpec};
use tlm_core::mesh::{rectangle_triangles, MATERIAL_TAG, X_MAX_TAG, X_MIN_TAG, Y_MAX_TAG, Y_MIN_TAG};
use tlm_core::{assemble, TlmError};

const HAND_WRITTEN_CASE: &str = r#"{
    "mesh": {
        "nodes": [
            {"x": 0.0, "y": 0.0},
            {"x": 0.5, "y": 0.0},
            {"x": 1.0, "y": 0.0}
        ],
        "elements": [
            {"element_type": "point", "connectivity": [1, 3], "tags": [10, 11]},
            {"element_type": "line", "connectivity": [1, 2, 2, 3], "tags": [1, 1]}
        ]
    },
    "equation": {
        "time_step": 0.25,
        "materials": [
            {"name": "copper", "tags": [1], "diffusion": 2.0, "capacitance": 4.0}
        ],
        "boundaries": [
            {"name": "ends", "tags": [10, 11], "conditions": [
                {"type": "value", "data": [1.0]},
                {"type": "adiabatic"}
            ]}
        ],
        "outputs": {"node_center": true}
    }
}"#;

#[test]
fn test_hand_written_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case.json");
    std::fs::write(&path, HAND_WRITTEN_CASE).unwrap();

    let case = CaseFile::from_json_file(&path).unwrap();
    assert_eq!(case.mesh.num_nodes(), 3);
    assert_eq!(case.mesh.num_elements(), 4);
    assert!(case.equation.strict_topology);
    assert_eq!(case.equation.materials[0].name, "copper");

    // R = 0.25 / 2 and Z = 0.25 / (2 · 4 · 0.25) are matched
    let system = assemble(&case.mesh, &case.equation).unwrap();
    assert_eq!(system.layout.num_ports, 4);
    assert_eq!(system.layout.outputs.len(), 2);
    assert_eq!(system.scattering.get(0, 0), 0.0);
    assert_relative_eq!(system.sources[0], 0.5);
    assert_relative_eq!(system.sources[3], 0.5);

    let mut case = case;
    case.equation.boundary_rank = 1;
    let system = assemble(&case.mesh, &case.equation).unwrap();
    assert_eq!(system.sources[0], 0.0);
}

#[test]
fn test_case_round_trip_assembles_identically() {
    let mesh = rectangle_triangles(0.0, 2.0, 0.0, 1.0, 4, 2);
    let equation = EquationConfig::new(0.05)
        .with_material(MaterialSpec::heat(vec![MATERIAL_TAG], 0.5, 1000.0, 4.0).with_source(10.0))
        .with_boundary(BoundarySpec::new(
            vec![X_MIN_TAG, X_MAX_TAG],
            BoundaryCondition::Convective {
                ambient: 20.0,
                coefficient: 15.0,
            },
        ))
        .with_boundary(BoundarySpec::new(
            vec![Y_MIN_TAG, Y_MAX_TAG],
            BoundaryCondition::Flux { flux: 3.0 },
        ))
        .with_initial_value(37.0);
    let case = CaseFile { mesh, equation };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case.json");
    case.to_json_file(&path).unwrap();
    let loaded = CaseFile::from_json_file(&path).unwrap();
    assert_eq!(loaded, case);

    let a = assemble(&case.mesh, &case.equation).unwrap();
    let b = assemble(&loaded.mesh, &loaded.equation).unwrap();
    assert_eq!(a.layout, b.layout);
    assert_eq!(a.sources, b.sources);
    assert_eq!(a.initial_incident, b.initial_incident);
    for row in 0..a.layout.num_ports {
        for col in 0..a.layout.num_ports {
            assert_eq!(a.scattering.get(row, col), b.scattering.get(row, col));
        }
    }
}

#[test]
fn test_malformed_case_is_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, HAND_WRITTEN_CASE.replace(r#""data": [1.0]"#, r#""data": []"#)).unwrap();
    assert!(matches!(CaseFile::from_json_file(&path), Err(TlmError::Json(_))));
}
