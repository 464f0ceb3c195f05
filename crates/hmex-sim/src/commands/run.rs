use std::error::Error;

use clap::Args;
use hmex_post::{fit_magnetization, plot_aggregates, post_process};
use tracing::info;

use super::sweep::{sweep_config, SweepArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub sweep: SweepArgs,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = args.sweep.config.load()?;
    sweep_config(&config, &args.sweep)?;
    let post = post_process(&config)?;
    let (params, fitted) = fit_magnetization(&config)?;
    let plots = plot_aggregates(&config)?;
    info!(
        per_site = post.per_site.len(),
        invalid_angles = post.invalid_angles.len(),
        fit_failures = fitted.failures.len(),
        params = %params.display(),
        plots = plots.len(),
        "pipeline finished"
    );
    Ok(())
}
