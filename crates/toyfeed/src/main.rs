mod cli;
mod run;
mod settings;
mod trace;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Command::Run(args) => run::run(args),
        Command::Trace(args) => trace::trace(args),
    }
}
