use std::path::Path;

use topoc_core::compiler::{self, CompileError};
use topoc_core::resolver::Resolution;

use crate::commands::{CommandLine, load, reject};
use crate::terminal::{format, print};
use crate::tprint;

pub fn routes(file: &Path, cmd: &CommandLine) -> anyhow::Result<()> {
    let (topology, config) = load(file, cmd)?;

    let resolution = match compiler::analyze(topology, &config) {
        Ok((_, resolution)) => resolution,
        Err(CompileError::Invalid(violations)) => return Err(reject(&violations)),
        Err(err) => return Err(err.into()),
    };

    print_tables(&resolution, config.quiet);
    print::end_of_program();
    Ok(())
}

fn print_tables(resolution: &Resolution, quiet: u8) {
    for (idx, table) in resolution.tables.iter().enumerate() {
        print::tree_head(idx, &table.subnet.to_string());
        print::as_tree_one_level(table.entries.iter().map(format::entry_to_detail).collect());
        if idx + 1 != resolution.tables.len() {
            tprint!();
        }
    }

    tprint!();
    print::header("transit gateways", quiet);
    for (idx, (gateway, entries)) in resolution.gateway_tables.iter().enumerate() {
        print::tree_head(idx, &format!("gateway/{gateway}"));
        let details: Vec<format::Detail> = entries
            .iter()
            .map(|(block, attachment)| (attachment.clone(), format::block(block)))
            .collect();
        print::as_tree_one_level(details);
    }
}
