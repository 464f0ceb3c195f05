use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hmex_core::config::RunnerConfig;
use hmex_core::errors::{ErrorInfo, HmexError};
use hmex_core::grid::format_value;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-observable training log as emitted by the simulation framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableLog {
    /// Iteration indices at which the observable was recorded.
    #[serde(default)]
    pub iters: Vec<u64>,
    /// Recorded mean values.
    #[serde(rename = "Mean")]
    pub mean: MeanValues,
}

/// Encodings accepted for the `Mean` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeanValues {
    /// Real values.
    Real(Vec<f64>),
    /// Separate real and imaginary arrays.
    Split {
        /// Real parts.
        real: Vec<f64>,
        /// Imaginary parts.
        imag: Vec<f64>,
    },
    /// `[re, im]` pairs.
    Pairs(Vec<[f64; 2]>),
}

impl MeanValues {
    /// Number of recorded values.
    pub fn len(&self) -> usize {
        match self {
            MeanValues::Real(values) => values.len(),
            MeanValues::Split { real, .. } => real.len(),
            MeanValues::Pairs(pairs) => pairs.len(),
        }
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values as complex numbers; split arrays of unequal length are rejected.
    pub fn to_complex(&self) -> Result<Vec<Complex64>, HmexError> {
        match self {
            MeanValues::Real(values) => Ok(values.iter().map(|&re| Complex64::new(re, 0.0)).collect()),
            MeanValues::Split { real, imag } => {
                if real.len() != imag.len() {
                    return Err(HmexError::Numeric(
                        ErrorInfo::new("mean_split_length", "real and imaginary arrays differ in length")
                            .with_context("real", real.len().to_string())
                            .with_context("imag", imag.len().to_string()),
                    ));
                }
                Ok(real
                    .iter()
                    .zip(imag)
                    .map(|(&re, &im)| Complex64::new(re, im))
                    .collect())
            }
            MeanValues::Pairs(pairs) => Ok(pairs.iter().map(|&[re, im]| Complex64::new(re, im)).collect()),
        }
    }
}

/// Full training log of one `(J, h)` simulation, keyed by observable name.
pub type RuntimeLog = BTreeMap<String, ObservableLog>;

/// Time budget and cancellation flag for one runner invocation.
#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancel: Arc<AtomicBool>,
}

impl Deadline {
    /// Starts a deadline now with an optional timeout and a shared cancellation flag.
    pub fn new(timeout: Option<Duration>, cancel: Arc<AtomicBool>) -> Self {
        Self {
            expires_at: timeout.map(|limit| Instant::now() + limit),
            cancel,
        }
    }

    /// A deadline that never expires and cannot be cancelled from outside.
    pub fn unbounded() -> Self {
        Self::new(None, Arc::new(AtomicBool::new(false)))
    }

    /// True once the shared flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// True once the timeout has elapsed.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left before expiry, `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fails with a runner error when cancelled or expired.
    pub fn check(&self) -> Result<(), HmexError> {
        if self.is_cancelled() {
            return Err(HmexError::Runner(ErrorInfo::new(
                "runner_cancelled",
                "simulation cancelled",
            )));
        }
        if self.is_expired() {
            return Err(HmexError::Runner(ErrorInfo::new(
                "runner_timeout",
                "simulation exceeded its time limit",
            )));
        }
        Ok(())
    }
}

/// Runs one simulation for a fixed `(J, h)` and returns its training log.
///
/// Implementations must honour `deadline` and are shared across sweep
/// worker threads.
pub trait SimulationRunner: Send + Sync {
    /// Runs the simulation for coupling `j` and field `h`.
    fn run(&self, j: f64, h: f64, deadline: &Deadline) -> Result<RuntimeLog, HmexError>;
}

/// Runs an external program per `(J, h)` pair and parses its stdout as a [`RuntimeLog`].
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    args: Vec<String>,
    config_path: PathBuf,
    poll_interval: Duration,
}

impl CommandRunner {
    /// Creates a runner invoking `program args --J <J> --h <h> --config <config_path>`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            config_path: config_path.into(),
            poll_interval: Duration::from_millis(50),
        }
    }

    /// Builds the runner from configuration; the program must be set.
    pub fn from_config(config: &RunnerConfig, config_path: &Path) -> Result<Self, HmexError> {
        let program = config.program.clone().ok_or_else(|| {
            HmexError::Config(
                ErrorInfo::new("runner_program", "no simulation program configured")
                    .with_hint("set runner.program to an executable that prints the training log as JSON"),
            )
        })?;
        Ok(Self::new(program, config.args.clone(), config_path))
    }

    /// Overrides how often the child process is polled.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn pair_error(&self, code: &str, message: impl Into<String>, j: f64, h: f64) -> HmexError {
        HmexError::Runner(
            ErrorInfo::new(code, message)
                .with_context("program", self.program.display().to_string())
                .with_context("j", format_value(j))
                .with_context("h", format_value(h)),
        )
    }
}

type PipeHandle = thread::JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> PipeHandle {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut buffer)?;
        }
        Ok(buffer)
    })
}

fn collect(handle: PipeHandle, stream: &str) -> Result<Vec<u8>, HmexError> {
    let pipe_error = |message: String| {
        HmexError::Runner(ErrorInfo::new("runner_pipe", message).with_context("stream", stream))
    };
    match handle.join() {
        Ok(Ok(buffer)) => Ok(buffer),
        Ok(Err(err)) => Err(pipe_error(format!("failed to read child {stream}: {err}"))),
        Err(_) => Err(pipe_error(format!("reader thread for child {stream} panicked"))),
    }
}

impl SimulationRunner for CommandRunner {
    fn run(&self, j: f64, h: f64, deadline: &Deadline) -> Result<RuntimeLog, HmexError> {
        deadline.check()?;
        debug!(program = %self.program.display(), j, h, "spawning simulation");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--J")
            .arg(format_value(j))
            .arg("--h")
            .arg(format_value(h))
            .arg("--config")
            .arg(&self.config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| self.pair_error("runner_spawn", err.to_string(), j, h))?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if let Err(err) = deadline.check() {
                        let _ = child.kill();
                        let _ = child.wait();
                        let info = err.info().clone();
                        return Err(self.pair_error(&info.code, info.message, j, h));
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(err) => {
                    let _ = child.kill();
                    return Err(self.pair_error("runner_wait", err.to_string(), j, h));
                }
            }
        };
        let with_pair = |err: HmexError| {
            let info = err.info().clone();
            let mut pair = self.pair_error(&info.code, info.message, j, h);
            if let HmexError::Runner(payload) = &mut pair {
                payload.context.extend(info.context);
            }
            pair
        };
        let stdout = collect(stdout, "stdout").map_err(&with_pair)?;
        let stderr = collect(stderr, "stderr").map_err(&with_pair)?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(HmexError::Runner(
                ErrorInfo::new("runner_exit", format!("simulation exited with {status}"))
                    .with_context("program", self.program.display().to_string())
                    .with_context("j", format_value(j))
                    .with_context("h", format_value(h))
                    .with_context("stderr", stderr.trim().to_string()),
            ));
        }
        serde_json::from_slice(&stdout).map_err(|err| {
            self.pair_error("runner_output", format!("stdout is not a training log: {err}"), j, h)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
        }
    }

    #[test]
    fn read_failures_surface_as_pipe_errors() {
        let err = collect(drain(Some(BrokenPipe)), "stdout").expect_err("read fails");
        assert_eq!(err.info().code, "runner_pipe");
        assert_eq!(err.info().context["stream"], "stdout");
        assert!(err.info().message.contains("pipe closed"));
    }

    #[test]
    fn absent_pipe_reads_empty() {
        let bytes = collect(drain(None::<BrokenPipe>), "stderr").expect("empty");
        assert!(bytes.is_empty());
    }

    #[test]
    fn panicking_reader_is_reported() {
        let handle: PipeHandle = thread::spawn(|| panic!("reader died"));
        let err = collect(handle, "stderr").expect_err("panic");
        assert_eq!(err.info().code, "runner_pipe");
    }
}
