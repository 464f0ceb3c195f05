use std::error::Error;

use clap::Args;
use hmex_post::fit_magnetization;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct FitArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &FitArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    let (path, outcome) = fit_magnetization(&config)?;
    println!("{}", path.display());
    for failure in &outcome.failures {
        println!("fit failed for {}: {}", failure.column, failure.error);
    }
    Ok(())
}
