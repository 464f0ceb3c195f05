use std::error::Error;

use clap::Args;
use hmex_core::grid::format_value;
use hmex_sweep::config_hash;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &CheckConfigArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    let grid = &config.sweep;
    let tracked: Vec<&str> = config
        .tracked_observables()
        .iter()
        .map(|obs| obs.as_str())
        .collect();
    println!("config: {}", args.config.config.display());
    println!("hash: {}", config_hash(&config)?);
    println!(
        "J: {} values from {} to {}",
        grid.j.len(),
        format_value(grid.j.min()),
        format_value(grid.j.max())
    );
    println!(
        "h: {} values from {} to {}",
        grid.h.len(),
        format_value(grid.h.min()),
        format_value(grid.h.max())
    );
    println!("pairs: {}", grid.pair_count());
    println!("observables: {}", tracked.join(", "));
    println!("sites: {}", config.site_count());
    println!("output: {}", config.output.root.display());
    Ok(())
}
