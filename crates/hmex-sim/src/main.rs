use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{
    check_config::{self, CheckConfigArgs},
    fit::{self, FitArgs},
    info::{self, InfoArgs},
    plot::{self, PlotArgs},
    post::{self, PostArgs},
    run::{self, RunArgs},
    sweep::{self, SweepArgs},
};

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "hmex", about = "Magnetisation sweeps of the Heisenberg model in a longitudinal field")]
struct Cli {
    /// Also write log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep, post-process, fit and plot in one go.
    Run(RunArgs),
    /// Run the (J, h) sweep and write the series, per-J and global tables.
    Sweep(SweepArgs),
    /// Per-site normalisation, susceptibility and angle of the global tables.
    Post(PostArgs),
    /// Fit the configured model to the per-site magnetisation.
    Fit(FitArgs),
    /// Plot every global table.
    Plot(PlotArgs),
    /// Write lattice, Hilbert space and Hamiltonian descriptions.
    Info(InfoArgs),
    /// Parse and validate a configuration, then print its sweep summary.
    CheckConfig(CheckConfigArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Sweep(args) => sweep::run(&args),
        Command::Post(args) => post::run(&args),
        Command::Fit(args) => fit::run(&args),
        Command::Plot(args) => plot::run(&args),
        Command::Info(args) => info::run(&args),
        Command::CheckConfig(args) => check_config::run(&args),
    }
}
