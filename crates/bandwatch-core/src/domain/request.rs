use time::Date;
use uuid::Uuid;

use crate::{DateWindow, Instrument, Interval, ValidationError, WindowPolicy};

/// Validated input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub request_id: Uuid,
    pub instrument: Instrument,
    pub interval: Interval,
    pub window: DateWindow,
}

impl PipelineRequest {
    pub fn new(
        instrument: Instrument,
        interval: Interval,
        end: Date,
        policy: &WindowPolicy,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            request_id: Uuid::new_v4(),
            window: policy.window_for(interval, end)?,
            instrument,
            interval,
        })
    }

    /// Arguments for the fetch step: `<instrument> <start> <end> <interval>`.
    pub fn fetch_args(&self) -> Vec<String> {
        vec![
            self.instrument.to_string(),
            self.window.start_arg(),
            self.window.end_arg(),
            self.interval.to_string(),
        ]
    }

    /// Arguments for the analysis step: `<interval>`.
    pub fn analysis_args(&self) -> Vec<String> {
        vec![self.interval.to_string()]
    }

    /// Directory-name prefix that identifies this run on disk.
    pub fn run_label(&self) -> String {
        format!(
            "{}-{}-{}-",
            self.instrument.as_str().replace('^', "_"),
            self.interval,
            self.request_id.simple()
        )
    }
}
