use std::error::Error;

use clap::Args;
use hmex_post::plot_global_tables;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &PlotArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    for path in plot_global_tables(&config.output)? {
        println!("{}", path.display());
    }
    Ok(())
}
