//! sqlguard CLI - static checking of SQL templates against declared tables

use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{check, tables};

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        cli::Commands::Check(args) => check::execute(args, &cli.global),
        cli::Commands::Tables(args) => tables::execute(args, &cli.global),
    };

    if let Err(err) = result {
        let code = match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => *code,
            None => {
                eprintln!("Error: {err:#}");
                1
            }
        };
        std::process::exit(code);
    }
}
