use std::error::Error;

use clap::Args;
use hmex_sweep::write_simulation_info;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &InfoArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    for path in write_simulation_info(&config)? {
        println!("{}", path.display());
    }
    Ok(())
}
