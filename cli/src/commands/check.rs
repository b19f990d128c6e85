use std::path::Path;

use colored::*;
use tracing::info;

use topoc_core::compiler::{self, CompileError};

use crate::commands::{CommandLine, load, reject};
use crate::terminal::{colors, print};

pub fn check(file: &Path, cmd: &CommandLine) -> anyhow::Result<()> {
    let (topology, config) = load(file, cmd)?;

    let (graph, resolution) = match compiler::analyze(topology, &config) {
        Ok(analysis) => analysis,
        Err(CompileError::Invalid(violations)) => return Err(reject(&violations)),
        Err(err) => return Err(err.into()),
    };

    let topology = graph.topology();
    let counts: String = format!(
        "{} networks, {} subnets, {} gateways, {} attachments, {} routes, {} consumers",
        topology.networks().count(),
        topology.subnets().count(),
        topology.gateways().count(),
        topology.attachments().count(),
        topology.routes().count(),
        topology.consumers().count(),
    );

    match config.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&counts.color(colors::TEXT_DEFAULT).to_string());
        }
        _ => info!("{counts}"),
    }

    let warnings: ColoredString = format!("{} warning(s)", resolution.warnings.len()).yellow();
    info!("{} is valid, {warnings}", file.display().to_string().bold());
    Ok(())
}
