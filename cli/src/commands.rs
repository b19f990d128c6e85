pub mod check;
pub mod plan;
pub mod routes;

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use tracing::error;

use topoc_common::config::Config;
use topoc_common::error::Violations;
use topoc_common::topology::Topology;
use topoc_core::declaration::Declaration;

use crate::terminal::print;

#[derive(Parser)]
#[command(name = "topoc")]
#[command(about = "Validates network topology declarations and compiles them into deployment plans.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Environment segment of resource names
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Organisation segment of resource names
    #[arg(long, global = true)]
    pub corp: Option<String>,

    /// Service segment of resource names
    #[arg(long, global = true)]
    pub service: Option<String>,

    /// Key pair handed to NAT instances
    #[arg(long, global = true)]
    pub key_pair: Option<String>,

    /// Fail when route resolution produces warnings
    #[arg(long, global = true)]
    pub deny_warnings: bool,

    /// Reduce output; repeat for less
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Skip the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a declaration and report every violation
    #[command(alias = "c")]
    Check { file: PathBuf },
    /// Print the effective route table of every subnet
    #[command(alias = "r")]
    Routes { file: PathBuf },
    /// Emit the ordered deployment plan
    #[command(alias = "p")]
    Plan {
        file: PathBuf,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
        /// Write the JSON plan to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Defaults, then declaration parameters, then flags.
    pub fn config(&self, declaration: &Declaration) -> Config {
        let mut config = Config::default();
        declaration.parameters.apply(&mut config);

        if let Some(env) = &self.env {
            config.naming.env = env.clone();
        }
        if let Some(corp) = &self.corp {
            config.naming.corp = corp.clone();
        }
        if let Some(service) = &self.service {
            config.naming.service = service.clone();
        }
        if let Some(key_pair) = &self.key_pair {
            config.key_pair = key_pair.clone();
        }
        config.deny_warnings = self.deny_warnings;
        config.quiet = self.quiet;
        config
    }
}

/// Reads a declaration and builds its topology. Violations are printed
/// and summarized by the returned error.
pub fn load(file: &Path, cmd: &CommandLine) -> anyhow::Result<(Topology, Config)> {
    let declaration = Declaration::from_path(file)
        .with_context(|| format!("could not load {}", file.display()))?;
    let config = cmd.config(&declaration);

    match declaration.into_topology() {
        Ok(topology) => Ok((topology, config)),
        Err(violations) => Err(reject(&violations)),
    }
}

/// Logs every violation once; the returned error only counts them.
pub fn reject(violations: &Violations) -> anyhow::Error {
    print::header("violations", 0);
    for violation in violations.iter() {
        error!("{violation}");
    }
    anyhow!("{} violation(s) found", violations.len())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
