//! Command-line configuration for the `bandwatch` server.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--bind` | `127.0.0.1:5000` | Listen address |
//! | `--fetch-command` | `python fetch_data.py` | Fetch step command line |
//! | `--analysis-command` | `python find_support_levels.py` | Analysis step command line |
//! | `--work-dir` | system temp dir | Parent of per-request scratch directories |
//! | `--step-timeout-secs` | `120` | Limit for each external step |
//! | `--max-concurrent-runs` | `8` | Pipeline runs allowed at once |
//! | `--intraday-lookback-days` | `91` | History requested for `1h` |
//! | `--daily-lookback-years` | `10` | History requested for `1d` |
//! | `--end-date` | today (UTC) | Fixed window end, `YYYY-MM-DD` |
//! | `--static-dir` | none | Chart frontend served at `/` |
//! | `--log-filter` | `RUST_LOG` or `info` | Tracing filter directives |
//!
//! # Examples
//!
//! ```bash
//! # Serve the chart frontend next to the API
//! bandwatch --static-dir ./frontend
//!
//! # Use a virtualenv interpreter and a shorter timeout
//! bandwatch --fetch-command ".venv/bin/python fetch_data.py" --step-timeout-secs 30
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bandwatch_core::{parse_date, PipelineConfig, StepCommand, ValidationError, WindowPolicy};
use clap::Parser;
use time::Date;

/// Serves price history annotated with support ranges.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bandwatch",
    author,
    version,
    about = "Price history annotated with support ranges over HTTP",
    long_about = "Bandwatch answers GET /api/data?ticker=<symbol>&interval=<1h|1d> by running \
an external fetch step, an external support-range analysis step, and merging both into one \
JSON series for charting."
)]
pub struct ServerArgs {
    /// Address the HTTP server listens on.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Fetch step command line; receives `<ticker> <start> <end> <interval>`.
    ///
    /// Must write `stock_data_<interval>.csv` into its working directory.
    #[arg(long, default_value = "python fetch_data.py")]
    pub fetch_command: String,

    /// Analysis step command line; receives `<interval>`.
    ///
    /// Must print one `Support Range ... <min>-<max>` line per row.
    #[arg(long, default_value = "python find_support_levels.py")]
    pub analysis_command: String,

    /// Directory under which each request gets its own scratch directory.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Seconds each external step may run before it is killed.
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub step_timeout_secs: u64,

    /// Maximum number of pipeline runs holding external processes at once.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent_runs: u32,

    /// Days of history requested for hourly data.
    #[arg(long, default_value_t = 91, value_parser = clap::value_parser!(u16).range(1..))]
    pub intraday_lookback_days: u16,

    /// Calendar years of history requested for daily data.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub daily_lookback_years: u16,

    /// Fixed end of the fetch window (YYYY-MM-DD). Defaults to today in UTC.
    #[arg(long, value_parser = parse_date)]
    pub end_date: Option<Date>,

    /// Directory of static files served for paths other than the API.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Tracing filter, e.g. `bandwatch_core=debug,info`. Overrides `RUST_LOG`.
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl ServerArgs {
    /// Builds the pipeline configuration, resolving relative paths against
    /// `base` so they survive the change into scratch directories.
    pub fn pipeline_config(&self, base: &Path) -> Result<PipelineConfig, ValidationError> {
        let defaults = PipelineConfig::default();

        Ok(PipelineConfig {
            fetch_command: StepCommand::parse(&self.fetch_command)?.anchored_at(base),
            analysis_command: StepCommand::parse(&self.analysis_command)?.anchored_at(base),
            work_root: self
                .work_dir
                .as_ref()
                .map_or(defaults.work_root, |dir| base.join(dir)),
            step_timeout: Duration::from_secs(self.step_timeout_secs),
            max_concurrent_runs: self.max_concurrent_runs as usize,
            window_policy: WindowPolicy {
                intraday_lookback_days: self.intraday_lookback_days,
                daily_lookback_years: self.daily_lookback_years,
            },
        })
    }
}
