use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, HmexError};

/// Quantities tracked per training iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Observable {
    /// Variational energy; also supplies the iteration indices.
    #[serde(rename = "Energy")]
    Energy,
    /// Total magnetisation along x, `Σ σx_i / 2`.
    #[serde(rename = "MSX")]
    Msx,
    /// Total magnetisation along y, `Σ σy_i / 2`.
    #[serde(rename = "MSY")]
    Msy,
    /// Total magnetisation along z, `Σ σz_i / 2`.
    #[serde(rename = "MSZ")]
    Msz,
    /// Bond correlator `-J Σ_<ij> σy_i σy_j`.
    #[serde(rename = "chi_corrZ")]
    ChiCorrZ,
}

impl Observable {
    /// Every known observable in canonical column order.
    pub const ALL: [Observable; 5] = [
        Observable::Energy,
        Observable::Msx,
        Observable::Msy,
        Observable::Msz,
        Observable::ChiCorrZ,
    ];

    /// Name used in logs, file names and column headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Observable::Energy => "Energy",
            Observable::Msx => "MSX",
            Observable::Msy => "MSY",
            Observable::Msz => "MSZ",
            Observable::ChiCorrZ => "chi_corrZ",
        }
    }

    /// True for the three magnetisation components.
    pub fn is_magnetization(&self) -> bool {
        matches!(self, Observable::Msx | Observable::Msy | Observable::Msz)
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Observable {
    type Err = HmexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Observable::ALL
            .iter()
            .copied()
            .find(|obs| obs.as_str() == s)
            .ok_or_else(|| {
                HmexError::Config(
                    ErrorInfo::new("unknown_observable", format!("unknown observable '{s}'"))
                        .with_hint("expected one of Energy, MSX, MSY, MSZ, chi_corrZ"),
                )
            })
    }
}

/// Full tracked list: `Energy` first, then the configured observables without duplicates.
pub fn tracked_observables(configured: &[Observable]) -> Vec<Observable> {
    let mut tracked = vec![Observable::Energy];
    for obs in configured {
        if !tracked.contains(obs) {
            tracked.push(*obs);
        }
    }
    tracked
}
