//! Assemble a TLM system from a JSON case file
//!
//! The case file holds the mesh and the equation configuration (see
//! `tlm_core::config::CaseFile`). The assembled operators are written as JSON
//! with CSR matrices.
//!
//! Usage:
//!     tlm-assemble --case case.json --output system.json

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use solvers::CsrMatrix;
use std::path::PathBuf;
use std::time::Instant;
use tlm_core::config::CaseFile;
use tlm_core::{assemble, SystemLayout};

#[derive(Parser, Debug)]
#[command(name = "tlm-assemble")]
#[command(about = "Assemble the TLM scattering system of a diffusion case")]
struct Args {
    /// Path to the JSON case file (mesh + equation)
    #[arg(short, long)]
    case: PathBuf,

    /// Output JSON file path
    #[arg(short, long, default_value = "system.json")]
    output: PathBuf,

    /// Skip intersections shared by more than two elements instead of failing
    #[arg(long)]
    lenient: bool,

    /// Override the boundary condition rank
    #[arg(long)]
    boundary_rank: Option<usize>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct AssembledSystem {
    layout: SystemLayout,
    scattering: CsrMatrix,
    sources: Vec<f64>,
    output_scattering: CsrMatrix,
    output_sources: Vec<f64>,
    initial_incident: Vec<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut case = CaseFile::from_json_file(&args.case)
        .with_context(|| format!("failed to load case {}", args.case.display()))?;
    if args.lenient {
        case.equation.strict_topology = false;
    }
    if let Some(rank) = args.boundary_rank {
        case.equation.boundary_rank = rank;
    }

    let start = Instant::now();
    let system = assemble(&case.mesh, &case.equation).context("assembly failed")?;
    log::info!("assembly took {:.1} ms", start.elapsed().as_secs_f64() * 1e3);

    let export = AssembledSystem {
        layout: system.layout,
        scattering: system.scattering.into_csr(),
        sources: system.sources.to_vec(),
        output_scattering: system.output_scattering.into_csr(),
        output_sources: system.output_sources.to_vec(),
        initial_incident: system.initial_incident.to_vec(),
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    std::fs::write(&args.output, json)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ports, {} output rows to {}",
        export.layout.num_ports,
        export.layout.outputs.len(),
        args.output.display()
    );
    Ok(())
}
