use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use hmex_core::config::{load_config, HmexConfig};

pub mod check_config;
pub mod fit;
pub mod info;
pub mod plot;
pub mod post;
pub mod run;
pub mod sweep;

/// Location of the YAML configuration shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// YAML configuration describing the sweep, simulation and outputs.
    #[arg(long)]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<HmexConfig, Box<dyn Error>> {
        Ok(load_config(&self.config)?)
    }
}
