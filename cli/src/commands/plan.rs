use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::*;
use tracing::info;

use topoc_core::compiler::{self, CompileError};
use topoc_core::plan::{Operation, Plan, PlanExecutor};

use crate::commands::{CommandLine, load, reject};
use crate::terminal::{colors, format, print};

/// Renders each operation instead of provisioning it.
struct DryRun {
    quiet: u8,
    applied: usize,
}

impl PlanExecutor for DryRun {
    fn apply(&mut self, operation: &Operation) -> anyhow::Result<()> {
        print::print(&format::operation_line(self.applied, operation));
        if self.quiet == 0
            && let Some(detail) = format::dependencies(operation)
        {
            print::as_tree_one_level(vec![detail]);
        }
        self.applied += 1;
        Ok(())
    }
}

pub fn plan(
    file: &Path,
    json: bool,
    output: Option<&Path>,
    cmd: &CommandLine,
) -> anyhow::Result<()> {
    let (topology, config) = load(file, cmd)?;

    let compilation = match compiler::compile(topology, &config) {
        Ok(compilation) => compilation,
        Err(CompileError::Invalid(violations)) => return Err(reject(&violations)),
        Err(err) => return Err(err.into()),
    };

    if json || output.is_some() {
        return write_json(&compilation.plan, output);
    }

    let mut dry_run = DryRun {
        quiet: config.quiet,
        applied: 0,
    };
    let applied = compilation.plan.execute(&mut dry_run)?;
    print_summary(applied, compilation.warnings().len(), config.quiet);
    Ok(())
}

fn write_json(plan: &Plan, output: Option<&Path>) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(plan).context("could not serialize the plan")?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("could not write {}", path.display()))?;
            info!("wrote {} operation(s) to {}", plan.len(), path.display());
        }
        None => print::print(&text),
    }
    Ok(())
}

fn print_summary(operations: usize, warnings: usize, quiet: u8) {
    let operations: ColoredString = format!("{operations} operations").bold().green();
    let warnings: ColoredString = format!("{warnings} warnings").bold().yellow();
    let output: String = format!("Plan Complete: {operations}, {warnings}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => info!("{output}"),
    }
}
