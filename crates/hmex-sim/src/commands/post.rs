use std::error::Error;

use clap::Args;
use hmex_post::post_process;

use super::ConfigArgs;

#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &PostArgs) -> Result<(), Box<dyn Error>> {
    let config = args.config.load()?;
    let outcome = post_process(&config)?;
    for path in &outcome.per_site {
        println!("{}", path.display());
    }
    println!("{}", outcome.susceptibility.display());
    println!("{}", outcome.angle.display());
    for invalid in &outcome.invalid_angles {
        println!(
            "invalid angle input: column {} row {} value {}",
            invalid.column, invalid.row, invalid.value
        );
    }
    Ok(())
}
