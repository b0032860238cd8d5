mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use commands::execute;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let exit_code = execute(cli)?;
    std::process::exit(exit_code);
}
