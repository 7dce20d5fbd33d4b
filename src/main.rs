mod agents;
mod cli;
mod config;
mod console;
mod error;
mod gradle;
mod logging;
mod utils;
mod workflow;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use console::Console;
use std::process;
use tracing::warn;

fn main() {
    let cli = Cli::parse();
    let console = Console::new();
    logging::init(cli.verbose, console.progress_handle());

    let progress = console.progress_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        progress.finish_and_clear();
        process::exit(130);
    }) {
        warn!("unable to install Ctrl-C handler: {e}");
    }

    let result = {
        let _guard = console.guard();
        match cli.command {
            Commands::List => workflow::execute_list(&cli.path, &cli.releases_url, &console),
            Commands::Upgrade(args) => {
                workflow::execute_upgrade(&cli.path, &cli.releases_url, &args.into(), &console)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
