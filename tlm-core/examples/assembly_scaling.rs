//! 3D TLM assembly scaling analysis
//!
//! Assembles a cooling cube (tetrahedra, convective walls) for increasing mesh
//! sizes and prints the time spent meshing, assembling and stepping.
//!
//! Run with different thread counts:
//!   RAYON_NUM_THREADS=1 cargo run -p tlm-core --example assembly_scaling -r -F parallel
//!   RAYON_NUM_THREADS=4 cargo run -p tlm-core --example assembly_scaling -r -F parallel

use solvers::SparseBackend;
use std::time::Instant;
use tlm_core::assemble;
use tlm_core::config::{
    BetweenApproximation, BoundaryCondition, BoundarySpec, EquationConfig, MaterialSpec,
    OutputRequest,
};
use tlm_core::mesh::{
    unit_cube_tetrahedra, MATERIAL_TAG, X_MAX_TAG, X_MIN_TAG, Y_MAX_TAG, Y_MIN_TAG, Z_MAX_TAG,
    Z_MIN_TAG,
};

const STEPS: usize = 100;

fn main() -> tlm_core::Result<()> {
    println!();
    println!("=== 3D TLM Assembly Scaling Analysis ===");
    println!();

    #[cfg(feature = "parallel")]
    {
        let num_threads = rayon::current_num_threads();
        println!("Parallelism: ENABLED ({} threads)", num_threads);
    }

    #[cfg(not(feature = "parallel"))]
    {
        println!("Parallelism: DISABLED (single-threaded)");
    }

    println!();
    println!("Problem: ρc ∂T/∂t = ∇·(k∇T) in [0,1]³, T(0) = 80, convective walls at 20");
    println!();

    let equation = EquationConfig::new(1e-3)
        .with_material(MaterialSpec::heat(vec![MATERIAL_TAG], 1.0, 1.0, 1.0).with_name("unit"))
        .with_boundary(
            BoundarySpec::new(
                vec![X_MIN_TAG, X_MAX_TAG, Y_MIN_TAG, Y_MAX_TAG, Z_MIN_TAG, Z_MAX_TAG],
                BoundaryCondition::Convective {
                    ambient: 20.0,
                    coefficient: 10.0,
                },
            )
            .with_name("walls"),
        )
        .with_outputs(OutputRequest {
            node_center: true,
            between: false,
            flux: false,
            approximation: BetweenApproximation::default(),
        })
        .with_initial_value(80.0);

    println!(
        "{:>4} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "n", "Elements", "Ports", "NNZ", "Mesh(ms)", "Asm(ms)", "Step(ms)", "Mean T"
    );
    println!("{}", "-".repeat(82));

    for n in [4, 8, 12, 16] {
        let start_mesh = Instant::now();
        let mesh = unit_cube_tetrahedra(n);
        let mesh_time = start_mesh.elapsed();

        let start_asm = Instant::now();
        let system = assemble(&mesh, &equation)?;
        let asm_time = start_asm.elapsed();

        let start_step = Instant::now();
        let mut incident = system.initial_incident.clone();
        for _ in 0..STEPS {
            incident = system.step(&incident);
        }
        let step_time = start_step.elapsed();

        let centres = system.outputs(&incident);
        let mean = centres.mean().unwrap_or(f64::NAN);

        println!(
            "{:>4} {:>10} {:>10} {:>10} {:>10.2} {:>10.2} {:>10.2} {:>10.3}",
            n,
            system.layout.num_nodes,
            system.layout.num_ports,
            system.scattering.nnz(),
            mesh_time.as_secs_f64() * 1000.0,
            asm_time.as_secs_f64() * 1000.0,
            step_time.as_secs_f64() * 1000.0,
            mean
        );
    }

    println!();
    Ok(())
}
