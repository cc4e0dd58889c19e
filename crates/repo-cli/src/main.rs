//! Repository layout CLI
//!
//! Classifies file paths within known repositories using the layout
//! documents under `--config`.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Some(cmd) => execute_command(&cli.config, cli.options.as_deref(), cmd),
        None => {
            println!("{} Repository layout engine", "repo-layout".green().bold());
            println!();
            println!("Run {} for available commands.", "repo-layout --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(
    config: &std::path::Path,
    options: Option<&std::path::Path>,
    cmd: Commands,
) -> Result<()> {
    let options = commands::load_options(options)?;

    match cmd {
        Commands::Validate => commands::run_validate(config, &options),
        Commands::List => commands::run_list(&commands::open_manager(config, options)?),
        Commands::Categorize {
            repo,
            path,
            version,
            json,
        } => {
            let manager = commands::open_manager(config, options)?;
            commands::run_categorize(&manager, &repo, &path, version.as_deref(), json)
        }
        Commands::Show { repo, version, json } => {
            let manager = commands::open_manager(config, options)?;
            commands::run_show(&manager, &repo, version.as_deref(), json)
        }
        Commands::Related { repo } => {
            commands::run_related(&commands::open_manager(config, options)?, &repo)
        }
    }
}
