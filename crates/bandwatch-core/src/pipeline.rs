//! Fetch → analyze → merge orchestration.
//!
//! A run is two strictly sequential stages. Stage one runs the fetch step and
//! yields a [`FetchArtifact`]; stage two runs the analysis step against the
//! same directory. Both steps execute inside a scratch directory owned by the
//! run, so concurrent runs on the same interval never read each other's
//! artifact even though the step writes a fixed file name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use crate::align::merge_positional;
use crate::parse::{parse_price_records, parse_support_ranges, Diagnostic, ParsedRecords};
use crate::runner::{ProcessStepRunner, Step, StepCommand, StepError, StepInvocation, StepOutput, StepRunner};
use crate::{EnrichedDataPoint, Interval, PipelineError, PipelineRequest, WindowPolicy};

/// Runtime settings for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub fetch_command: StepCommand,
    pub analysis_command: StepCommand,
    /// Parent of the per-run scratch directories.
    pub work_root: PathBuf,
    /// Upper bound on each step; the child is killed when it elapses.
    pub step_timeout: Duration,
    /// Runs allowed to hold external processes at the same time.
    pub max_concurrent_runs: usize,
    pub window_policy: WindowPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_command: StepCommand::python("fetch_data.py"),
            analysis_command: StepCommand::python("find_support_levels.py"),
            work_root: std::env::temp_dir().join("bandwatch"),
            step_timeout: Duration::from_secs(120),
            max_concurrent_runs: 8,
            window_policy: WindowPolicy::default(),
        }
    }
}

/// Merged series for one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub points: Vec<EnrichedDataPoint>,
    /// Rows and lines that were tolerated while parsing both step outputs.
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineOutcome {
    pub fn supported_points(&self) -> usize {
        self.points.iter().filter(|point| point.has_support()).count()
    }
}

/// Reference to the file produced by the fetch step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchArtifact {
    path: PathBuf,
    file_name: &'static str,
}

impl FetchArtifact {
    /// Locates the artifact for `interval` inside `dir`.
    pub async fn locate(dir: &Path, interval: Interval) -> Result<Self, PipelineError> {
        let file_name = interval.artifact_file_name();
        let path = dir.join(file_name);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Self { path, file_name }),
            Ok(false) => Err(PipelineError::OutputMissing {
                file_name: file_name.to_owned(),
                path,
            }),
            Err(source) => Err(PipelineError::ArtifactUnreadable {
                file_name: file_name.to_owned(),
                source,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the artifact. Invalid UTF-8 is replaced, not rejected.
    pub async fn load(&self) -> Result<ParsedRecords, PipelineError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                PipelineError::OutputMissing {
                    file_name: self.file_name.to_owned(),
                    path: self.path.clone(),
                }
            } else {
                PipelineError::ArtifactUnreadable {
                    file_name: self.file_name.to_owned(),
                    source,
                }
            }
        })?;

        Ok(parse_price_records(&String::from_utf8_lossy(&bytes)))
    }
}

/// Orchestrates the two external steps for each request.
pub struct Pipeline<R = ProcessStepRunner> {
    runner: R,
    config: PipelineConfig,
    permits: Arc<Semaphore>,
}

impl Pipeline<ProcessStepRunner> {
    pub fn with_processes(config: PipelineConfig) -> Self {
        Self::new(ProcessStepRunner, config)
    }
}

impl<R: StepRunner> Pipeline<R> {
    pub fn new(runner: R, config: PipelineConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_runs.max(1)));
        Self {
            runner,
            config,
            permits,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs fetch, parse, analysis, parse and merge for one request. Any
    /// failure aborts the run; nothing is retried.
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineError> {
        let span = tracing::info_span!(
            "pipeline",
            request_id = %request.request_id,
            instrument = %request.instrument,
            interval = %request.interval,
        );

        async move {
            // The semaphore is never closed, so acquisition only waits.
            let _permit = self.permits.acquire().await.ok();
            let started = Instant::now();

            let run_dir = self.prepare_run_dir(request).await?;

            let artifact = self.fetch(request, run_dir.path()).await?;
            let records = artifact.load().await?;
            tracing::debug!(
                rows = records.records.len(),
                tolerated = records.diagnostics.len(),
                "price artifact parsed"
            );

            let analysis = self
                .execute(Step::Analysis, &self.config.analysis_command, request.analysis_args(), run_dir.path())
                .await?;
            let ranges = parse_support_ranges(&analysis.stdout);

            let mut diagnostics = records.diagnostics;
            diagnostics.extend(ranges.diagnostics);
            for diagnostic in &diagnostics {
                tracing::warn!(%diagnostic, "tolerated malformed step output");
            }

            let outcome = PipelineOutcome {
                request_id: request.request_id,
                points: merge_positional(records.records, &ranges.ranges),
                diagnostics,
            };

            if ranges.ranges.len() != outcome.points.len() {
                tracing::debug!(
                    points = outcome.points.len(),
                    ranges = ranges.ranges.len(),
                    "range count differs from point count"
                );
            }
            tracing::info!(
                points = outcome.points.len(),
                supported = outcome.supported_points(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipeline run completed"
            );

            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn prepare_run_dir(&self, request: &PipelineRequest) -> Result<TempDir, PipelineError> {
        let work_root = self.config.work_root.clone();
        let label = request.run_label();

        // `tempfile` only offers blocking creation.
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&work_root)?;
            tempfile::Builder::new().prefix(&label).tempdir_in(&work_root)
        })
        .await
        .map_err(|error| PipelineError::Workspace(std::io::Error::other(error)))?
        .map_err(PipelineError::Workspace)
    }

    async fn fetch(&self, request: &PipelineRequest, dir: &Path) -> Result<FetchArtifact, PipelineError> {
        self.execute(Step::Fetch, &self.config.fetch_command, request.fetch_args(), dir)
            .await?;
        FetchArtifact::locate(dir, request.interval).await
    }

    async fn execute(
        &self,
        step: Step,
        command: &StepCommand,
        args: Vec<String>,
        dir: &Path,
    ) -> Result<StepOutput, PipelineError> {
        let invocation = StepInvocation::new(step, command, args, dir).with_timeout(self.config.step_timeout);

        let output = self.runner.run(invocation).await.map_err(|error| match error {
            StepError::Spawn { program, source } => PipelineError::ProcessSpawn {
                step,
                program,
                source,
            },
            StepError::TimedOut { timeout } => PipelineError::StepTimedOut { step, timeout },
            StepError::Io(source) => step_failed(step, String::from("output not collected"), source.to_string()),
        })?;

        log_output(step, &output);

        if !output.success() {
            tracing::warn!(%step, status = %output.status_text(), "step failed");
            return Err(step_failed(step, output.status_text(), output.diagnostics()));
        }

        Ok(output)
    }
}

fn step_failed(step: Step, status: String, diagnostics: String) -> PipelineError {
    match step {
        Step::Fetch => PipelineError::FetchFailed {
            status,
            diagnostics,
        },
        Step::Analysis => PipelineError::AnalysisFailed {
            status,
            diagnostics,
        },
    }
}

fn log_output(step: Step, output: &StepOutput) {
    tracing::debug!(
        %step,
        status = %output.status_text(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "step exited"
    );
    for line in output.stdout.lines().filter(|line| !line.trim().is_empty()) {
        tracing::debug!(%step, stream = "stdout", "{line}");
    }
    for line in output.stderr.lines().filter(|line| !line.trim().is_empty()) {
        tracing::debug!(%step, stream = "stderr", "{line}");
    }
}
