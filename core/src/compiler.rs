//! Validate, resolve and emit in one call.

use thiserror::Error;
use tracing::{debug, info};

use topoc_common::config::Config;
use topoc_common::error::Violations;
use topoc_common::topology::Topology;

use crate::plan::{self, Plan, PlanError};
use crate::resolver::{self, Resolution, ResolveError, Warning};
use crate::validator::{self, VerifiedGraph};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Invalid(Violations),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("{} warning(s) denied", .0.len())]
    Warnings(Vec<Warning>),
}

#[derive(Debug)]
pub struct Compilation {
    pub graph: VerifiedGraph,
    pub resolution: Resolution,
    pub plan: Plan,
}

impl Compilation {
    pub fn warnings(&self) -> &[Warning] {
        &self.resolution.warnings
    }
}

/// Runs the static passes up to route resolution, without emitting a plan.
pub fn analyze(topology: Topology, config: &Config) -> Result<(VerifiedGraph, Resolution), CompileError> {
    let graph = validator::validate(topology).map_err(CompileError::Invalid)?;
    debug!("validated {} entities", graph.topology().len());

    let resolution = resolver::resolve(&graph)?;
    debug!(
        "resolved {} route table(s), {} warning(s)",
        resolution.tables.len(),
        resolution.warnings.len()
    );

    if config.deny_warnings && !resolution.warnings.is_empty() {
        return Err(CompileError::Warnings(resolution.warnings));
    }
    Ok((graph, resolution))
}

pub fn compile(topology: Topology, config: &Config) -> Result<Compilation, CompileError> {
    let (graph, resolution) = analyze(topology, config)?;
    let plan = plan::emit(&graph, &resolution, config)?;
    info!("compiled {} operation(s)", plan.len());

    Ok(Compilation {
        graph,
        resolution,
        plan,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
