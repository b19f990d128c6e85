mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, plan, routes};
use terminal::{logging, print};

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let quiet = match &commands.command {
        Commands::Plan { json: true, .. } => 2,
        _ => commands.quiet,
    };
    logging::init_logging(quiet);
    print::banner(commands.no_banner, quiet);

    match &commands.command {
        Commands::Check { file } => {
            print::header("checking declaration", quiet);
            check::check(file, &commands)
        }
        Commands::Routes { file } => {
            print::header("resolving routes", quiet);
            routes::routes(file, &commands)
        }
        Commands::Plan { file, json, output } => {
            print::header("emitting plan", quiet);
            plan::plan(file, *json, output.as_deref(), &commands)
        }
    }
}
