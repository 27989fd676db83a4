//! External step execution.
//!
//! The pipeline only knows the narrow contract of an analysis step: program
//! and arguments in, exit status plus captured stdout/stderr out. Everything
//! about how the step computes its result stays on the other side of
//! [`StepRunner`].

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;

use crate::ValidationError;

/// The two external steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Fetch,
    Analysis,
}

impl Step {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Analysis => "analysis",
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Program plus leading arguments for one step, e.g. `python fetch_data.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    program: String,
    args: Vec<String>,
}

impl StepCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self, ValidationError> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(ValidationError::EmptyCommand);
        }
        Ok(Self { program, args })
    }

    /// `python <script>`, the form both default steps take.
    pub fn python(script: &str) -> Self {
        Self {
            program: String::from("python"),
            args: vec![script.to_owned()],
        }
    }

    /// Splits a command line on whitespace. Quoting is not interpreted.
    pub fn parse(line: &str) -> Result<Self, ValidationError> {
        let mut parts = line.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or(ValidationError::EmptyCommand)?;
        Self::new(program, parts.collect())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Rewrites relative paths that exist under `base` as absolute paths, so
    /// the command still resolves when run from a per-request directory.
    pub fn anchored_at(self, base: &Path) -> Self {
        let anchor = |value: String| {
            let candidate = Path::new(&value);
            if candidate.is_relative() && base.join(candidate).exists() {
                base.join(candidate).to_string_lossy().into_owned()
            } else {
                value
            }
        };

        Self {
            program: anchor(self.program),
            args: self.args.into_iter().map(anchor).collect(),
        }
    }
}

impl Display for StepCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A fully specified step execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInvocation {
    pub step: Step,
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    pub timeout: Duration,
}

impl StepInvocation {
    pub fn new(
        step: Step,
        command: &StepCommand,
        extra_args: Vec<String>,
        current_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut args = command.args().to_vec();
        args.extend(extra_args);
        Self {
            step,
            program: command.program().to_owned(),
            args,
            current_dir: current_dir.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Exit status and captured output of a finished step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl StepOutput {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    pub fn status_text(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => String::from("terminated by signal"),
        }
    }

    /// Text explaining a failure: stderr, else stdout, else the exit status.
    pub fn diagnostics(&self) -> String {
        [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.status_text())
    }
}

/// Runner-level failure: the step never produced an exit status.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {}s", timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("failed to collect step output: {0}")]
    Io(#[from] std::io::Error),
}

/// Executes external steps.
pub trait StepRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: StepInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<StepOutput, StepError>> + Send + 'a>>;
}

/// Runs steps as child processes, killing any child that outlives its timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStepRunner;

impl StepRunner for ProcessStepRunner {
    fn run<'a>(
        &'a self,
        invocation: StepInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<StepOutput, StepError>> + Send + 'a>> {
        Box::pin(async move {
            let started = Instant::now();
            let child = Command::new(&invocation.program)
                .args(&invocation.args)
                .current_dir(&invocation.current_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| StepError::Spawn {
                    program: invocation.program.clone(),
                    source,
                })?;

            tracing::debug!(
                step = %invocation.step,
                pid = child.id(),
                program = %invocation.program,
                args = ?invocation.args,
                "step started"
            );

            // Dropping the pending future on timeout drops the child, which kills it.
            let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
                .await
                .map_err(|_| StepError::TimedOut {
                    timeout: invocation.timeout,
                })??;

            Ok(StepOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                elapsed: started.elapsed(),
            })
        })
    }
}
