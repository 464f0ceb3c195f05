use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use hmex_core::config::{HmexConfig, SimulationConfig};
use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::grid::{format_value, SweepGrid};
use hmex_core::hash::stable_hash_string;
use hmex_core::serde::{from_json_slice, to_canonical_json_bytes};
use serde::{Deserialize, Serialize};

/// Outcome recorded for one `(J, h)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairState {
    /// The series file was written.
    Complete,
    /// The invocation failed and the pair was marked missing.
    Missing,
}

/// Progress of a sweep, keyed by `J=<J>,h=<h>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepCheckpoint {
    /// Hash of the sweep grid and simulation configuration.
    pub config_hash: String,
    /// Recorded pairs.
    pub pairs: BTreeMap<String, PairState>,
}

#[derive(Serialize)]
struct HashedConfig<'a> {
    sweep: &'a SweepGrid,
    simulation: &'a SimulationConfig,
}

/// Hash of the parts of the configuration that determine simulation results.
pub fn config_hash(config: &HmexConfig) -> Result<String, HmexError> {
    stable_hash_string(&HashedConfig {
        sweep: &config.sweep,
        simulation: &config.simulation,
    })
}

fn pair_key(j: f64, h: f64) -> String {
    format!("J={},h={}", format_value(j), format_value(h))
}

impl SweepCheckpoint {
    /// Empty checkpoint for the given configuration hash.
    pub fn new(config_hash: impl Into<String>) -> Self {
        Self {
            config_hash: config_hash.into(),
            pairs: BTreeMap::new(),
        }
    }

    /// Loads a checkpoint; `None` when no file exists.
    pub fn load(path: &Path) -> Result<Option<Self>, HmexError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|err| HmexError::io("checkpoint_read", path, err))?;
        from_json_slice(&bytes).map(Some).map_err(|err| match err {
            HmexError::Serde(info) => HmexError::Serde(info.with_path(path)),
            other => other,
        })
    }

    /// Loads a checkpoint for resuming, rejecting one written for another configuration.
    pub fn resume(path: &Path, config_hash: &str) -> Result<Self, HmexError> {
        match Self::load(path)? {
            Some(existing) if existing.config_hash != config_hash => Err(HmexError::Config(
                ErrorInfo::new("checkpoint_mismatch", "checkpoint belongs to a different configuration")
                    .with_path(path)
                    .with_context("expected", config_hash)
                    .with_context("found", existing.config_hash)
                    .with_hint("rerun without --resume or restore the original configuration"),
            )),
            Some(existing) => Ok(existing),
            None => Ok(Self::new(config_hash)),
        }
    }

    /// Writes the checkpoint atomically through a temporary sibling file.
    pub fn store(&self, path: &Path) -> Result<(), HmexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| HmexError::io("checkpoint_dir", parent, err))?;
        }
        let bytes = to_canonical_json_bytes(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|err| HmexError::io("checkpoint_write", &tmp, err))?;
        fs::rename(&tmp, path).map_err(|err| HmexError::io("checkpoint_rename", path, err))
    }

    /// Records the outcome of a pair.
    pub fn record(&mut self, j: f64, h: f64, state: PairState) {
        self.pairs.insert(pair_key(j, h), state);
    }

    /// Recorded state of a pair.
    pub fn state(&self, j: f64, h: f64) -> Option<PairState> {
        self.pairs.get(&pair_key(j, h)).copied()
    }

    /// True when the pair completed in an earlier run.
    pub fn is_complete(&self, j: f64, h: f64) -> bool {
        self.state(j, h) == Some(PairState::Complete)
    }
}
