use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::runner::Step;

/// Validation errors for inbound request parameters and parsed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument cannot be empty")]
    EmptyInstrument,
    #[error("instrument length {len} exceeds max {max}")]
    InstrumentTooLong { len: usize, max: usize },
    #[error("instrument must start with an ASCII letter, digit or '^': '{ch}'")]
    InstrumentInvalidStart { ch: char },
    #[error("instrument contains invalid character '{ch}' at index {index}")]
    InstrumentInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1h, 1d")]
    InvalidInterval { value: String },
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
    #[error("date window cannot end before it starts")]
    EmptyWindow,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("support range max must be >= min")]
    InvertedRange,

    #[error("step command cannot be empty")]
    EmptyCommand,
}

/// Machine-readable classification of a failed pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    FetchFailed,
    OutputMissing,
    ArtifactUnreadable,
    AnalysisFailed,
    ProcessSpawn,
    StepTimedOut,
    Workspace,
}

impl PipelineErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::OutputMissing => "output_missing",
            Self::ArtifactUnreadable => "artifact_unreadable",
            Self::AnalysisFailed => "analysis_failed",
            Self::ProcessSpawn => "process_spawn",
            Self::StepTimedOut => "step_timed_out",
            Self::Workspace => "workspace_unavailable",
        }
    }
}

impl Display for PipelineErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure of a single pipeline run. Any variant aborts the whole request.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch step failed: {diagnostics}")]
    FetchFailed { status: String, diagnostics: String },

    #[error("fetch step output not found: {file_name}")]
    OutputMissing { file_name: String, path: PathBuf },

    #[error("fetch step output unreadable: {file_name}: {source}")]
    ArtifactUnreadable {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis step failed: {diagnostics}")]
    AnalysisFailed { status: String, diagnostics: String },

    #[error("{step} step could not be started ({program}): {source}")]
    ProcessSpawn {
        step: Step,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} step timed out after {}s", timeout.as_secs())]
    StepTimedOut { step: Step, timeout: Duration },

    #[error("could not prepare run directory: {0}")]
    Workspace(#[source] std::io::Error),
}

impl PipelineError {
    pub const fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::FetchFailed { .. } => PipelineErrorKind::FetchFailed,
            Self::OutputMissing { .. } => PipelineErrorKind::OutputMissing,
            Self::ArtifactUnreadable { .. } => PipelineErrorKind::ArtifactUnreadable,
            Self::AnalysisFailed { .. } => PipelineErrorKind::AnalysisFailed,
            Self::ProcessSpawn { .. } => PipelineErrorKind::ProcessSpawn,
            Self::StepTimedOut { .. } => PipelineErrorKind::StepTimedOut,
            Self::Workspace(_) => PipelineErrorKind::Workspace,
        }
    }

    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }
}
