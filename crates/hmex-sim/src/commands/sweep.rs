use std::error::Error;
use std::time::Duration;

use clap::Args;
use hmex_core::config::{FailurePolicy, HmexConfig};
use hmex_core::grid::format_value;
use hmex_sweep::{
    run_sweep, write_simulation_info, CommandRunner, PairEvent, PairStatus, SweepOptions,
    SweepOutcome, SIMULATION_CONFIG_FILE,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::ConfigArgs;

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Skip pairs already recorded as complete in the checkpoint, e.g. after an interrupt.
    #[arg(long)]
    pub resume: bool,
    /// Number of J values simulated in parallel.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Per-pair wall clock limit, overriding the configuration.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Mark failed pairs as missing instead of aborting.
    #[arg(long)]
    pub mark_missing: bool,
    /// Hide the progress bar.
    #[arg(long)]
    pub quiet: bool,
}

impl SweepArgs {
    fn options(&self, config: &HmexConfig) -> SweepOptions {
        let mut opts = SweepOptions::from_config(&config.runner);
        opts.resume = self.resume;
        if let Some(concurrency) = self.concurrency {
            opts.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout_secs {
            opts.timeout = Some(Duration::from_secs(secs));
        }
        if self.mark_missing {
            opts.failure_policy = FailurePolicy::MarkMissing;
        }
        opts
    }
}

fn progress_bar(total: usize, hidden: bool) -> Result<ProgressBar, Box<dyn Error>> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}] {msg}",
    )?);
    Ok(bar)
}

/// Runs the sweep of an already loaded configuration.
pub fn sweep_config(config: &HmexConfig, args: &SweepArgs) -> Result<SweepOutcome, Box<dyn Error>> {
    config.output.create_all()?;
    write_simulation_info(config)?;
    let manifest = config.output.info_dir().join(SIMULATION_CONFIG_FILE);
    let runner = CommandRunner::from_config(&config.runner, &manifest)?;
    let opts = args.options(config);

    let bar = progress_bar(config.sweep.pair_count(), args.quiet)?;
    let observer = |event: &PairEvent| {
        bar.set_position(event.finished as u64);
        let label = format!("J={} h={}", format_value(event.j), format_value(event.h));
        match event.status {
            PairStatus::Missing => bar.println(format!("missing {label}")),
            PairStatus::Completed | PairStatus::Resumed => bar.set_message(label),
        }
    };
    let outcome = run_sweep(config, &runner, &opts, Some(&observer));
    bar.finish_and_clear();
    let outcome = outcome?;

    if !outcome.missing.is_empty() {
        warn!(count = outcome.missing.len(), "pairs marked missing");
    }
    info!(
        tables = outcome.global.len(),
        root = %config.output.root.display(),
        "global tables written"
    );
    Ok(outcome)
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    sweep_config(&config, args)?;
    Ok(())
}
