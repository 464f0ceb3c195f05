use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ErrorInfo, HmexError};
use crate::grid::SweepGrid;
use crate::layout::OutputLayout;
use crate::observable::{tracked_observables, Observable};

fn require_positive(code: &str, name: &str, value: f64) -> Result<(), HmexError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HmexError::Config(
            ErrorInfo::new(code, format!("{name} must be a positive finite number"))
                .with_context(name, value.to_string()),
        ))
    }
}

/// Complete configuration for one pipeline run, loaded once and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HmexConfig {
    /// Parameter axes and settling window.
    #[serde(default)]
    pub sweep: SweepGrid,
    /// Fixed configuration handed to the external simulation runner.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// How the external simulation runner is invoked.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output directory layout.
    #[serde(default)]
    pub output: OutputLayout,
    /// Plot toggles per artefact category.
    #[serde(default)]
    pub plots: PlotToggles,
    /// Post-processing and fitting options.
    #[serde(default)]
    pub post: PostConfig,
}

impl HmexConfig {
    /// Validates every section; the first failing check is reported.
    pub fn validate(&self) -> Result<(), HmexError> {
        self.sweep.validate()?;
        self.simulation.validate()?;
        self.runner.validate()?;
        self.post.validate(&self.tracked_observables())?;
        Ok(())
    }

    /// `Energy` followed by the configured observables.
    pub fn tracked_observables(&self) -> Vec<Observable> {
        tracked_observables(&self.simulation.observables)
    }

    /// Number of lattice sites used for per-site normalisation.
    pub fn site_count(&self) -> usize {
        self.simulation.lattice.n_sites()
    }
}

/// Loads and validates a YAML configuration file.
///
/// Unknown variants and malformed values are configuration errors; a missing
/// file is a missing-input error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HmexConfig, HmexError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HmexError::missing("config_missing", path));
    }
    let bytes = fs::read(path).map_err(|err| HmexError::io("config_read", path, err))?;
    let config: HmexConfig = serde_yaml::from_slice(&bytes).map_err(|err| {
        HmexError::Config(ErrorInfo::new("config_parse", err.to_string()).with_path(path))
    })?;
    config.validate()?;
    debug!(
        path = %path.display(),
        pairs = config.sweep.pair_count(),
        sites = config.site_count(),
        "loaded configuration"
    );
    Ok(config)
}

/// Fixed physics configuration: everything except the swept `(J, h)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Compute device requested from the simulation framework.
    #[serde(default)]
    pub device: Device,
    /// Lattice geometry.
    #[serde(default)]
    pub lattice: LatticeConfig,
    /// Local Hilbert space.
    #[serde(default)]
    pub hilbert: HilbertConfig,
    /// Neural-network variational ansatz.
    #[serde(default)]
    pub ansatz: AnsatzConfig,
    /// Monte Carlo sampler.
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Parameter optimizer.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Diagonal shift of the stochastic-reconfiguration preconditioner.
    #[serde(default = "default_diag_shift")]
    pub diag_shift: f64,
    /// Number of training iterations per `(J, h)` pair.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Number of Monte Carlo samples per iteration.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Observables tracked in addition to the energy.
    #[serde(default = "default_observables")]
    pub observables: Vec<Observable>,
}

fn default_diag_shift() -> f64 {
    0.01
}

fn default_iterations() -> usize {
    300
}

fn default_samples() -> usize {
    512
}

fn default_observables() -> Vec<Observable> {
    vec![
        Observable::Msx,
        Observable::Msy,
        Observable::Msz,
        Observable::ChiCorrZ,
    ]
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device: Device::default(),
            lattice: LatticeConfig::default(),
            hilbert: HilbertConfig::default(),
            ansatz: AnsatzConfig::default(),
            sampler: SamplerConfig::default(),
            optimizer: OptimizerConfig::default(),
            diag_shift: default_diag_shift(),
            iterations: default_iterations(),
            samples: default_samples(),
            observables: default_observables(),
        }
    }
}

impl SimulationConfig {
    /// Validates every sub-configuration.
    pub fn validate(&self) -> Result<(), HmexError> {
        self.lattice.validate()?;
        self.hilbert.validate()?;
        self.ansatz.validate()?;
        self.sampler.validate()?;
        self.optimizer.validate()?;
        if !(self.diag_shift.is_finite() && self.diag_shift >= 0.0) {
            return Err(HmexError::config("diag_shift", "diag_shift must be non-negative"));
        }
        if self.iterations == 0 {
            return Err(HmexError::config("iterations", "at least one training iteration is required"));
        }
        if self.samples == 0 {
            return Err(HmexError::config("samples", "at least one Monte Carlo sample is required"));
        }
        Ok(())
    }
}

/// Compute device for the simulation framework.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU.
    #[default]
    Cpu,
    /// GPU accelerator.
    Gpu,
}

/// Lattice geometry variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LatticeConfig {
    /// Hypercubic lattice of side `length` in `dim` dimensions.
    Hypercube {
        /// Sites per side.
        length: usize,
        /// Number of spatial dimensions.
        dim: usize,
        /// Periodic boundary conditions.
        #[serde(default = "default_pbc")]
        pbc: bool,
    },
    /// Lattice generated from a unit cell and its repetition counts.
    Custom {
        /// Primitive vectors, one per spatial dimension.
        basis_vectors: Vec<Vec<f64>>,
        /// Site coordinates inside the unit cell.
        atomic_positions: Vec<Vec<f64>>,
        /// Unit-cell repetitions along each basis vector.
        extent: Vec<usize>,
        /// Periodic boundary conditions.
        #[serde(default = "default_pbc")]
        pbc: bool,
        /// Point group used to build the space group; framework default when absent.
        #[serde(default)]
        point_group: Option<String>,
        /// Maximum neighbour order for edges; nearest neighbours when absent.
        #[serde(default)]
        max_neighbor_order: Option<u32>,
    },
}

fn default_pbc() -> bool {
    true
}

impl Default for LatticeConfig {
    fn default() -> Self {
        LatticeConfig::Hypercube {
            length: 4,
            dim: 2,
            pbc: true,
        }
    }
}

impl LatticeConfig {
    /// Number of lattice sites, `None` when it does not fit in `usize`.
    pub fn checked_n_sites(&self) -> Option<usize> {
        match self {
            LatticeConfig::Hypercube { length, dim, .. } => {
                length.checked_pow(u32::try_from(*dim).ok()?)
            }
            LatticeConfig::Custom {
                atomic_positions,
                extent,
                ..
            } => extent
                .iter()
                .try_fold(atomic_positions.len(), |acc, &cells| acc.checked_mul(cells)),
        }
    }

    /// Number of lattice sites.
    ///
    /// Saturates for lattices rejected by [`LatticeConfig::validate`].
    pub fn n_sites(&self) -> usize {
        self.checked_n_sites().unwrap_or(usize::MAX)
    }

    /// Number of nearest-neighbour bonds, when it follows from the geometry alone.
    pub fn n_edges(&self) -> Option<usize> {
        match self {
            LatticeConfig::Hypercube { length, dim, pbc } => {
                let per_line = match (*length, *pbc) {
                    (0 | 1, _) => 0,
                    (2, true) => 1,
                    (l, true) => l,
                    (l, false) => l - 1,
                };
                let cross_section = length.checked_pow(u32::try_from(dim.saturating_sub(1)).ok()?)?;
                dim.checked_mul(cross_section)?.checked_mul(per_line)
            }
            LatticeConfig::Custom { .. } => None,
        }
    }

    /// True when periodic boundary conditions are requested.
    pub fn periodic(&self) -> bool {
        match self {
            LatticeConfig::Hypercube { pbc, .. } | LatticeConfig::Custom { pbc, .. } => *pbc,
        }
    }

    /// Validates sizes and dimension consistency.
    pub fn validate(&self) -> Result<(), HmexError> {
        match self {
            LatticeConfig::Hypercube { length, dim, .. } => {
                if *length == 0 || *dim == 0 {
                    return Err(HmexError::config(
                        "lattice_hypercube",
                        "hypercube length and dim must be at least 1",
                    ));
                }
            }
            LatticeConfig::Custom {
                basis_vectors,
                atomic_positions,
                extent,
                max_neighbor_order,
                ..
            } => {
                let dim = basis_vectors.len();
                if dim == 0 {
                    return Err(HmexError::config("lattice_basis", "custom lattice needs basis vectors"));
                }
                if basis_vectors.iter().any(|v| v.len() != dim) {
                    return Err(HmexError::config(
                        "lattice_basis",
                        "every basis vector must have one component per dimension",
                    ));
                }
                if atomic_positions.is_empty() || atomic_positions.iter().any(|p| p.len() != dim) {
                    return Err(HmexError::config(
                        "lattice_atoms",
                        "atomic positions must be non-empty and match the lattice dimension",
                    ));
                }
                if extent.len() != dim || extent.contains(&0) {
                    return Err(HmexError::config(
                        "lattice_extent",
                        "extent needs one positive entry per basis vector",
                    ));
                }
                if *max_neighbor_order == Some(0) {
                    return Err(HmexError::config(
                        "lattice_neighbor_order",
                        "max_neighbor_order must be at least 1",
                    ));
                }
            }
        }
        if self.checked_n_sites().is_none() {
            return Err(HmexError::config(
                "lattice_size",
                "lattice site count does not fit in a machine word",
            ));
        }
        Ok(())
    }
}

/// Local Hilbert space variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HilbertConfig {
    /// Spin-`s` degrees of freedom on every lattice site.
    Spin {
        /// Spin quantum number.
        #[serde(default = "default_spin")]
        s: f64,
        /// Optional constraint on total magnetisation.
        #[serde(default)]
        total_sz: Option<f64>,
    },
    /// Bosonic modes in the Fock basis.
    Fock {
        /// Maximum occupation per mode; unbounded when absent.
        #[serde(default)]
        n_max: Option<u32>,
        /// Fixed particle number; unconstrained when absent.
        #[serde(default)]
        n_particles: Option<u32>,
        /// Number of bosonic modes.
        modes: usize,
    },
}

fn default_spin() -> f64 {
    0.5
}

impl Default for HilbertConfig {
    fn default() -> Self {
        HilbertConfig::Spin {
            s: default_spin(),
            total_sz: None,
        }
    }
}

impl HilbertConfig {
    /// Local dimension per site, `None` when unbounded.
    pub fn local_size(&self) -> Option<usize> {
        match self {
            HilbertConfig::Spin { s, .. } => Some((2.0 * s).round() as usize + 1),
            HilbertConfig::Fock { n_max, .. } => n_max.map(|n| n as usize + 1),
        }
    }

    /// Validates the spin value and mode count.
    pub fn validate(&self) -> Result<(), HmexError> {
        match self {
            HilbertConfig::Spin { s, total_sz } => {
                require_positive("hilbert_spin", "s", *s)?;
                if (2.0 * s).fract() != 0.0 {
                    return Err(HmexError::config("hilbert_spin", "spin must be a multiple of 1/2"));
                }
                if let Some(sz) = total_sz {
                    if !sz.is_finite() || (2.0 * sz).fract() != 0.0 {
                        return Err(HmexError::config(
                            "hilbert_total_sz",
                            "total_sz must be a finite multiple of 1/2",
                        ));
                    }
                }
            }
            HilbertConfig::Fock { modes, .. } => {
                if *modes == 0 {
                    return Err(HmexError::config("hilbert_modes", "fock space needs at least one mode"));
                }
            }
        }
        Ok(())
    }
}

/// Neural-network ansatz variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AnsatzConfig {
    /// Single dense complex layer with `2N` features and log-cosh activation.
    #[default]
    DenseFfnn,
    /// Translation-symmetric dense layer.
    DenseFfnnSym {
        /// Features per symmetry element.
        alpha: usize,
    },
    /// Group convolutional network over the lattice automorphisms.
    Gcnn {
        /// Feature dimensions of hidden layers, first to last.
        features: Vec<usize>,
        /// Number of layers.
        layers: usize,
    },
}

impl AnsatzConfig {
    /// Validates layer sizes.
    pub fn validate(&self) -> Result<(), HmexError> {
        match self {
            AnsatzConfig::DenseFfnn => Ok(()),
            AnsatzConfig::DenseFfnnSym { alpha } if *alpha == 0 => {
                Err(HmexError::config("ansatz_alpha", "alpha must be at least 1"))
            }
            AnsatzConfig::DenseFfnnSym { .. } => Ok(()),
            AnsatzConfig::Gcnn { features, layers } => {
                if *layers == 0 || features.len() != *layers || features.contains(&0) {
                    return Err(HmexError::config(
                        "ansatz_gcnn",
                        "gcnn needs one positive feature size per layer",
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Markov chain options shared by all samplers; absent fields use framework defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainOptions {
    /// Independent chains per rank.
    #[serde(default)]
    pub n_chains_per_rank: Option<usize>,
    /// Power to which the wavefunction amplitude is raised.
    #[serde(default)]
    pub machine_pow: Option<f64>,
}

/// Chain options with framework defaults filled in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedChains {
    /// Independent chains per rank.
    pub n_chains_per_rank: usize,
    /// Power to which the wavefunction amplitude is raised.
    pub machine_pow: f64,
}

impl ChainOptions {
    /// Default number of chains per rank.
    pub const DEFAULT_CHAINS: usize = 16;
    /// Default sampling power.
    pub const DEFAULT_MACHINE_POW: f64 = 2.0;

    /// Fills absent options with framework defaults.
    pub fn resolved(&self) -> ResolvedChains {
        ResolvedChains {
            n_chains_per_rank: self.n_chains_per_rank.unwrap_or(Self::DEFAULT_CHAINS),
            machine_pow: self.machine_pow.unwrap_or(Self::DEFAULT_MACHINE_POW),
        }
    }
}

/// Monte Carlo sampler variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SamplerConfig {
    /// Single-site Metropolis updates.
    Local {
        /// Chain options.
        #[serde(default)]
        chains: ChainOptions,
    },
    /// Metropolis exchange of site pairs within a graph distance.
    Exchange {
        /// Maximum graph distance of exchanged sites.
        #[serde(default = "default_d_max")]
        d_max: u32,
        /// Chain options.
        #[serde(default)]
        chains: ChainOptions,
    },
}

fn default_d_max() -> u32 {
    1
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig::Local {
            chains: ChainOptions::default(),
        }
    }
}

impl SamplerConfig {
    /// Chain options of either variant.
    pub fn chains(&self) -> &ChainOptions {
        match self {
            SamplerConfig::Local { chains } | SamplerConfig::Exchange { chains, .. } => chains,
        }
    }

    /// Validates chain counts and exchange distance.
    pub fn validate(&self) -> Result<(), HmexError> {
        let chains = self.chains();
        if chains.n_chains_per_rank == Some(0) {
            return Err(HmexError::config("sampler_chains", "n_chains_per_rank must be at least 1"));
        }
        if let Some(pow) = chains.machine_pow {
            require_positive("sampler_machine_pow", "machine_pow", pow)?;
        }
        if let SamplerConfig::Exchange { d_max: 0, .. } = self {
            return Err(HmexError::config("sampler_d_max", "d_max must be at least 1"));
        }
        Ok(())
    }
}

/// Parameter optimizer variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OptimizerConfig {
    /// Plain stochastic gradient descent.
    Sgd {
        /// Step size.
        learning_rate: f64,
    },
    /// AdaGrad with accumulator initialisation.
    #[serde(rename = "adagrad")]
    AdaGrad {
        /// Step size.
        learning_rate: f64,
        /// Small cutoff added to the accumulator.
        #[serde(default = "default_epscut")]
        epscut: f64,
        /// Initial accumulator value.
        #[serde(default = "default_initial_accumulator")]
        initial_accumulator_value: f64,
    },
    /// Adam with first and second moment decay rates.
    Adam {
        /// Step size.
        learning_rate: f64,
        /// First moment decay.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Second moment decay.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Denominator regulariser.
        #[serde(default = "default_adam_eps")]
        eps: f64,
    },
}

fn default_epscut() -> f64 {
    1e-6
}

fn default_initial_accumulator() -> f64 {
    0.1
}

fn default_beta1() -> f64 {
    0.9
}

fn default_beta2() -> f64 {
    0.999
}

fn default_adam_eps() -> f64 {
    1e-8
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Sgd {
            learning_rate: 0.01,
        }
    }
}

impl OptimizerConfig {
    /// Step size of any variant.
    pub fn learning_rate(&self) -> f64 {
        match self {
            OptimizerConfig::Sgd { learning_rate }
            | OptimizerConfig::AdaGrad { learning_rate, .. }
            | OptimizerConfig::Adam { learning_rate, .. } => *learning_rate,
        }
    }

    /// Validates rates and decay constants.
    pub fn validate(&self) -> Result<(), HmexError> {
        require_positive("optimizer_learning_rate", "learning_rate", self.learning_rate())?;
        match self {
            OptimizerConfig::Sgd { .. } => {}
            OptimizerConfig::AdaGrad {
                epscut,
                initial_accumulator_value,
                ..
            } => {
                require_positive("optimizer_epscut", "epscut", *epscut)?;
                if !(initial_accumulator_value.is_finite() && *initial_accumulator_value >= 0.0) {
                    return Err(HmexError::config(
                        "optimizer_accumulator",
                        "initial_accumulator_value must be non-negative",
                    ));
                }
            }
            OptimizerConfig::Adam {
                beta1, beta2, eps, ..
            } => {
                for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
                    if !(0.0..1.0).contains(beta) {
                        return Err(HmexError::Config(
                            ErrorInfo::new("optimizer_beta", "Adam decay rates must lie in [0, 1)")
                                .with_context(name, beta.to_string()),
                        ));
                    }
                }
                require_positive("optimizer_eps", "eps", *eps)?;
            }
        }
        Ok(())
    }
}

/// What happens to the sweep when one `(J, h)` invocation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the whole sweep with the runner error.
    #[default]
    Abort,
    /// Record the pair as missing (`NaN` summaries, no per-J column) and continue.
    MarkMissing,
}

/// Handling of the imaginary part of observable means.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ImaginaryPolicy {
    /// Drop imaginary parts silently.
    Discard,
    /// Drop imaginary parts, logging a warning when one exceeds the tolerance.
    Warn {
        /// Largest tolerated magnitude.
        tolerance: f64,
    },
    /// Fail extraction when an imaginary part exceeds the tolerance.
    Reject {
        /// Largest tolerated magnitude.
        tolerance: f64,
    },
}

impl Default for ImaginaryPolicy {
    fn default() -> Self {
        ImaginaryPolicy::Warn { tolerance: 1e-6 }
    }
}

/// External simulation runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Executable that runs one simulation and prints its log as JSON.
    #[serde(default)]
    pub program: Option<PathBuf>,
    /// Arguments placed before the `--J/--h/--config` arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-pair wall clock limit in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Behaviour when an invocation fails.
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Treatment of imaginary parts in the returned means.
    #[serde(default)]
    pub imaginary: ImaginaryPolicy,
}

impl RunnerConfig {
    /// Validates the timeout and imaginary tolerance.
    pub fn validate(&self) -> Result<(), HmexError> {
        if self.timeout_secs == Some(0) {
            return Err(HmexError::config("runner_timeout", "timeout_secs must be at least 1"));
        }
        match self.imaginary {
            ImaginaryPolicy::Discard => Ok(()),
            ImaginaryPolicy::Warn { tolerance } | ImaginaryPolicy::Reject { tolerance } => {
                if tolerance.is_finite() && tolerance >= 0.0 {
                    Ok(())
                } else {
                    Err(HmexError::config("runner_imaginary", "imaginary tolerance must be non-negative"))
                }
            }
        }
    }
}

/// Plot toggles per artefact category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotToggles {
    /// Observable vs iteration plots for every `(J, h)` pair.
    #[serde(default = "default_true")]
    pub series: bool,
    /// Observable vs field plots from the global tables.
    #[serde(default = "default_true")]
    pub aggregate: bool,
    /// Fitted curve overlays.
    #[serde(default = "default_true")]
    pub fit: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PlotToggles {
    fn default() -> Self {
        Self {
            series: true,
            aggregate: true,
            fit: true,
        }
    }
}

/// Parametric model fitted to per-site magnetisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// `a * x + b`.
    Linear,
    /// `a * tanh(b * x - c) + d`.
    #[default]
    Tanh,
}

/// Post-processing and fitting options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostConfig {
    /// Magnetisation component used for susceptibility, angle and fit.
    #[serde(default = "default_magnetization")]
    pub magnetization: Observable,
    /// Observables normalised per site; every tracked observable when absent.
    #[serde(default)]
    pub per_site: Option<Vec<Observable>>,
    /// Model fitted to the per-site magnetisation.
    #[serde(default)]
    pub fit_model: ModelKind,
    /// Stem for fit outputs (`<stem>_param.txt`, `<stem>_plot_(<col>).svg`).
    #[serde(default = "default_fit_name")]
    pub fit_name: String,
}

fn default_magnetization() -> Observable {
    Observable::Msz
}

fn default_fit_name() -> String {
    "MSZ_fit".to_string()
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            magnetization: default_magnetization(),
            per_site: None,
            fit_model: ModelKind::default(),
            fit_name: default_fit_name(),
        }
    }
}

impl PostConfig {
    /// Observables to normalise per site.
    pub fn per_site_observables(&self, tracked: &[Observable]) -> Vec<Observable> {
        match &self.per_site {
            Some(list) => list.clone(),
            None => tracked.to_vec(),
        }
    }

    /// Checks that referenced observables are tracked.
    pub fn validate(&self, tracked: &[Observable]) -> Result<(), HmexError> {
        if !self.magnetization.is_magnetization() {
            return Err(HmexError::Config(
                ErrorInfo::new("post_magnetization", "post.magnetization must be MSX, MSY or MSZ")
                    .with_context("observable", self.magnetization.as_str()),
            ));
        }
        if let Some(list) = &self.per_site {
            if !list.contains(&self.magnetization) {
                return Err(HmexError::Config(
                    ErrorInfo::new(
                        "post_per_site_magnetization",
                        "post.per_site must include post.magnetization",
                    )
                    .with_context("observable", self.magnetization.as_str()),
                ));
            }
        }
        for obs in std::iter::once(&self.magnetization).chain(self.per_site.iter().flatten()) {
            if !tracked.contains(obs) {
                return Err(HmexError::Config(
                    ErrorInfo::new("post_untracked", "post-processing references an untracked observable")
                        .with_context("observable", obs.as_str()),
                ));
            }
        }
        if self.fit_name.is_empty() || self.fit_name.chars().any(char::is_whitespace) {
            return Err(HmexError::config("post_fit_name", "fit_name must be non-empty without whitespace"));
        }
        Ok(())
    }
}
