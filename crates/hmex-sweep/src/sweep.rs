//! Nested `(J, h)` sweep producing per-pair, per-J and global tables.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hmex_core::config::{FailurePolicy, HmexConfig, RunnerConfig};
use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::grid::format_value;
use hmex_core::observable::Observable;
use hmex_core::table::Table;
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::checkpoint::{config_hash, PairState, SweepCheckpoint};
use crate::extract::{extract, persist, TimeSeries};
use crate::plots::plot_series;
use crate::runner::{Deadline, SimulationRunner};

/// Header of the iteration column in per-J tables.
pub const PER_J_AXIS: &str = "#iters";
/// Header of the field column in global tables.
pub const GLOBAL_AXIS: &str = "#h";

/// Options governing sweep execution.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Reuse pairs recorded as complete in the checkpoint.
    pub resume: bool,
    /// Number of J values processed in parallel.
    pub concurrency: usize,
    /// Per-pair wall clock limit.
    pub timeout: Option<Duration>,
    /// Behaviour when an invocation fails.
    pub failure_policy: FailurePolicy,
    /// Shared flag that stops the sweep when raised.
    ///
    /// Raised only by library callers. The `hmex` binary leaves it unset: an
    /// interrupt terminates the process, and `--resume` continues from the
    /// checkpoint written after every pair.
    pub cancel: Arc<AtomicBool>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            resume: false,
            concurrency: 1,
            timeout: None,
            failure_policy: FailurePolicy::Abort,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SweepOptions {
    /// Options derived from the runner section of the configuration.
    pub fn from_config(runner: &RunnerConfig) -> Self {
        Self {
            timeout: runner.timeout_secs.map(Duration::from_secs),
            failure_policy: runner.on_failure,
            ..Self::default()
        }
    }
}

/// How a pair was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    /// Simulated in this run.
    Completed,
    /// Reloaded from an earlier run.
    Resumed,
    /// Invocation failed and the pair was marked missing.
    Missing,
}

/// Progress notification sent after every pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEvent {
    /// Coupling value.
    pub j: f64,
    /// Field value.
    pub h: f64,
    /// Resolution of the pair.
    pub status: PairStatus,
    /// Pairs resolved so far, this one included.
    pub finished: usize,
    /// Pairs in the sweep.
    pub total: usize,
}

/// Callback invoked after every pair.
pub type SweepObserver<'a> = &'a (dyn Fn(&PairEvent) + Sync);

/// Per-observable tables for one coupling value.
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingTables {
    /// Coupling value.
    pub j: f64,
    /// `#iters` plus one `h=<h>` column per completed field value.
    pub tables: IndexMap<Observable, Table>,
}

/// Result of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    /// One `#h` by `j=<J>` table per tracked observable.
    pub global: IndexMap<Observable, Table>,
    /// Per-J tables in ascending J order.
    pub per_j: Vec<CouplingTables>,
    /// Pairs marked missing.
    pub missing: Vec<(f64, f64)>,
    /// Number of pairs reloaded from an earlier run.
    pub resumed: usize,
    /// Files written during this run.
    pub written: Vec<PathBuf>,
}

struct CouplingResult {
    tables: CouplingTables,
    summaries: IndexMap<Observable, Vec<f64>>,
    missing: Vec<(f64, f64)>,
    resumed: usize,
    written: Vec<PathBuf>,
}

enum PairOutcome {
    Series {
        series: TimeSeries,
        path: PathBuf,
        resumed: bool,
    },
    Missing,
}

struct SweepContext<'a> {
    config: &'a HmexConfig,
    runner: &'a dyn SimulationRunner,
    opts: &'a SweepOptions,
    tracked: Vec<Observable>,
    h_points: Vec<f64>,
    checkpoint: Mutex<SweepCheckpoint>,
    checkpoint_path: PathBuf,
    finished: AtomicUsize,
    total: usize,
    observer: Option<SweepObserver<'a>>,
}

/// Runs the full sweep described by `config`.
///
/// J values are processed on a dedicated pool of `opts.concurrency` threads;
/// results are merged in ascending J order, so the output does not depend on
/// the thread count.
pub fn run_sweep(
    config: &HmexConfig,
    runner: &dyn SimulationRunner,
    opts: &SweepOptions,
    observer: Option<SweepObserver<'_>>,
) -> Result<SweepOutcome, HmexError> {
    config.validate()?;
    let layout = &config.output;
    let hash = config_hash(config)?;
    let checkpoint_path = layout.checkpoint_file();
    let checkpoint = if opts.resume {
        SweepCheckpoint::resume(&checkpoint_path, &hash)?
    } else {
        SweepCheckpoint::new(hash)
    };
    checkpoint.store(&checkpoint_path)?;

    let j_points = config.sweep.j.points();
    let ctx = SweepContext {
        config,
        runner,
        opts,
        tracked: config.tracked_observables(),
        h_points: config.sweep.h.points(),
        checkpoint: Mutex::new(checkpoint),
        checkpoint_path,
        finished: AtomicUsize::new(0),
        total: config.sweep.pair_count(),
        observer,
    };
    info!(
        pairs = ctx.total,
        couplings = j_points.len(),
        fields = ctx.h_points.len(),
        concurrency = opts.concurrency,
        resume = opts.resume,
        "starting sweep"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .build()
        .map_err(|err| HmexError::Runner(ErrorInfo::new("thread_pool", err.to_string())))?;
    let results: Result<Vec<_>, HmexError> = pool.install(|| {
        j_points
            .par_iter()
            .enumerate()
            .map(|(index, &j)| ctx.sweep_coupling(j).map(|result| (index, result)))
            .collect()
    });
    let mut ordered = results?;
    ordered.sort_by_key(|(index, _)| *index);

    let mut global: IndexMap<Observable, Table> = IndexMap::with_capacity(ctx.tracked.len());
    for &obs in &ctx.tracked {
        let mut table = Table::new();
        table.push_column(GLOBAL_AXIS, ctx.h_points.clone())?;
        global.insert(obs, table);
    }
    let mut outcome = SweepOutcome {
        global: IndexMap::new(),
        per_j: Vec::with_capacity(ordered.len()),
        missing: Vec::new(),
        resumed: 0,
        written: Vec::new(),
    };
    for (_, result) in ordered {
        let label = format!("j={}", format_value(result.tables.j));
        for (obs, table) in global.iter_mut() {
            let column = result
                .summaries
                .get(obs)
                .cloned()
                .unwrap_or_else(|| vec![f64::NAN; ctx.h_points.len()]);
            table.push_column(label.clone(), column)?;
        }
        outcome.per_j.push(result.tables);
        outcome.missing.extend(result.missing);
        outcome.resumed += result.resumed;
        outcome.written.extend(result.written);
    }
    for (obs, table) in &global {
        let path = layout.global_file(*obs);
        table.write(&path)?;
        outcome.written.push(path);
    }
    outcome.global = global;

    info!(
        missing = outcome.missing.len(),
        resumed = outcome.resumed,
        files = outcome.written.len(),
        "sweep finished"
    );
    Ok(outcome)
}

impl SweepContext<'_> {
    fn sweep_coupling(&self, j: f64) -> Result<CouplingResult, HmexError> {
        let window = self.config.sweep.settling_window;
        let mut tables: IndexMap<Observable, Table> =
            self.tracked.iter().map(|&obs| (obs, Table::new())).collect();
        let mut summaries: IndexMap<Observable, Vec<f64>> = self
            .tracked
            .iter()
            .map(|&obs| (obs, Vec::with_capacity(self.h_points.len())))
            .collect();
        let mut missing = Vec::new();
        let mut written = Vec::new();
        let mut resumed_pairs = 0;

        for &h in &self.h_points {
            let status = match self.run_pair(j, h)? {
                PairOutcome::Series {
                    series,
                    path,
                    resumed,
                } => {
                    let label = format!("h={}", format_value(h));
                    for (obs, table) in tables.iter_mut() {
                        if table.is_empty() {
                            table.push_column(PER_J_AXIS, series.iters_f64())?;
                        }
                        let values = series.values(*obs).map(<[f64]>::to_vec).unwrap_or_default();
                        table.push_column(label.clone(), values)?;
                    }
                    let settled = series.summaries(window);
                    for (obs, column) in summaries.iter_mut() {
                        column.push(settled.get(obs).copied().unwrap_or(f64::NAN));
                    }
                    self.record(j, h, PairState::Complete)?;
                    if resumed {
                        resumed_pairs += 1;
                        PairStatus::Resumed
                    } else {
                        written.push(path);
                        PairStatus::Completed
                    }
                }
                PairOutcome::Missing => {
                    for column in summaries.values_mut() {
                        column.push(f64::NAN);
                    }
                    missing.push((j, h));
                    self.record(j, h, PairState::Missing)?;
                    PairStatus::Missing
                }
            };
            self.notify(j, h, status);
        }

        for (obs, table) in &tables {
            if table.is_empty() {
                warn!(j, observable = %obs, "no completed field values; per-J table not written");
                continue;
            }
            let path = self.config.output.per_j_file(*obs, j);
            table.write(&path)?;
            written.push(path);
        }
        info!(j, missing = missing.len(), "coupling finished");

        Ok(CouplingResult {
            tables: CouplingTables { j, tables },
            summaries,
            missing,
            resumed: resumed_pairs,
            written,
        })
    }

    fn run_pair(&self, j: f64, h: f64) -> Result<PairOutcome, HmexError> {
        let layout = &self.config.output;
        let observables = &self.config.simulation.observables;
        let path = layout.series_file(j, h);
        if self.opts.resume && self.is_complete(j, h) && path.exists() {
            debug!(j, h, path = %path.display(), "reusing completed pair");
            let series = TimeSeries::from_table(&Table::read(&path)?, observables)?;
            return Ok(PairOutcome::Series {
                series,
                path,
                resumed: true,
            });
        }

        let deadline = Deadline::new(self.opts.timeout, Arc::clone(&self.opts.cancel));
        deadline.check()?;
        let log = match self.runner.run(j, h, &deadline) {
            Ok(log) => log,
            Err(err) => return self.handle_failure(j, h, err),
        };
        let series = extract(&log, observables, self.config.runner.imaginary)?;
        let path = persist(&series, &layout.simulation_dir(), Some(j), Some(h))?;
        debug!(j, h, iterations = series.len(), "pair complete");
        if self.config.plots.series {
            plot_series(&series, &layout.series_plots_dir(), j, h)?;
        }
        Ok(PairOutcome::Series {
            series,
            path,
            resumed: false,
        })
    }

    fn handle_failure(&self, j: f64, h: f64, err: HmexError) -> Result<PairOutcome, HmexError> {
        if self.opts.cancel.load(Ordering::SeqCst) {
            return Err(err);
        }
        match (&err, self.opts.failure_policy) {
            (HmexError::Runner(_), FailurePolicy::MarkMissing) => {
                warn!(j, h, error = %err, "simulation failed; marking pair missing");
                Ok(PairOutcome::Missing)
            }
            _ => Err(err),
        }
    }

    fn is_complete(&self, j: f64, h: f64) -> bool {
        self.checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_complete(j, h)
    }

    fn record(&self, j: f64, h: f64, state: PairState) -> Result<(), HmexError> {
        let mut checkpoint = self.checkpoint.lock().unwrap_or_else(PoisonError::into_inner);
        checkpoint.record(j, h, state);
        checkpoint.store(&self.checkpoint_path)
    }

    fn notify(&self, j: f64, h: f64, status: PairStatus) {
        let finished = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(observer) = self.observer {
            observer(&PairEvent {
                j,
                h,
                status,
                finished,
                total: self.total,
            });
        }
    }
}
