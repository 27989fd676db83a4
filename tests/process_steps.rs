//! Behavior-driven tests for pipeline runs backed by real child processes.
//!
//! The external steps are small `sh` scripts honouring the same contract as
//! the production fetch and analysis scripts.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bandwatch_core::{
    parse_date, Instrument, Interval, Pipeline, PipelineConfig, PipelineErrorKind, PipelineRequest,
    ProcessStepRunner, Step, StepCommand, StepError, StepInvocation, StepRunner, WindowPolicy,
};
use tempfile::TempDir;

const FETCH_SCRIPT: &str = r#"
case "$1" in
  ZZZZ) echo "ticker not found" >&2; exit 1 ;;
  EMPTY) exit 0 ;;
esac
sleep 0.2
printf 'Datetime,Open,High,Low,Close,AdjClose,Volume\n' > "stock_data_$4.csv"
printf '2024-01-01,%s,12,9,11,11,1000\n' "$1" >> "stock_data_$4.csv"
printf '2024-01-02,11,13,10,12,12,1100\n' >> "stock_data_$4.csv"
printf '2024-01-03,12,14,11,13,13,1200\n' >> "stock_data_$4.csv"
echo "Data saved to stock_data_$4.csv"
"#;

const ANALYSIS_SCRIPT: &str = r#"
test -f "stock_data_$1.csv" || { echo "no data for $1" >&2; exit 3; }
echo "Support Ranges ($1, >=5% Rise):"
echo "Support Range 1: 9.50-10.50 INR (Bounced 3 times with >=5% rise)"
echo "Support Range 2: 10.00-11.00 INR (Bounced 2 times with >=5% rise)"
"#;

const HANGING_SCRIPT: &str = "sleep 30\n";

struct Fixture {
    _scripts: TempDir,
    work: TempDir,
    fetch: StepCommand,
    analysis: StepCommand,
}

fn write_script(dir: &Path, name: &str, body: &str) -> StepCommand {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    StepCommand::new("sh", vec![path.to_string_lossy().into_owned()]).expect("command")
}

fn fixture(analysis_body: &str) -> Fixture {
    let scripts = tempfile::tempdir().expect("scripts dir");
    let fetch = write_script(scripts.path(), "fetch.sh", FETCH_SCRIPT);
    let analysis = write_script(scripts.path(), "analysis.sh", analysis_body);
    Fixture {
        _scripts: scripts,
        work: tempfile::tempdir().expect("work dir"),
        fetch,
        analysis,
    }
}

impl Fixture {
    fn pipeline(&self, step_timeout: Duration) -> Pipeline {
        Pipeline::with_processes(PipelineConfig {
            fetch_command: self.fetch.clone(),
            analysis_command: self.analysis.clone(),
            work_root: self.work.path().to_path_buf(),
            step_timeout,
            ..PipelineConfig::default()
        })
    }
}

fn request(ticker: &str, interval: Interval) -> PipelineRequest {
    PipelineRequest::new(
        Instrument::parse(ticker).expect("valid instrument"),
        interval,
        parse_date("2025-04-18").expect("valid date"),
        &WindowPolicy::default(),
    )
    .expect("valid request")
}

// =============================================================================
// Pipeline runs
// =============================================================================

#[tokio::test]
async fn when_scripts_succeed_series_is_merged() {
    // Given: Fetch and analysis scripts that follow the step contract
    let fixture = fixture(ANALYSIS_SCRIPT);

    // When: Daily data is requested
    let outcome = fixture
        .pipeline(Duration::from_secs(10))
        .run(&request("AAPL", Interval::OneDay))
        .await
        .expect("run succeeds");

    // Then: Three rows, the first two annotated
    assert_eq!(outcome.points.len(), 3);
    assert_eq!(outcome.supported_points(), 2);
    assert_eq!(outcome.points[0].support_min(), Some(9.5));
    assert_eq!(
        outcome.points[0]
            .support
            .and_then(|range| range.observation_count),
        Some(3)
    );
    // The instrument lands in the Open column, which is reported as non-numeric.
    assert_eq!(outcome.points[0].record.open.as_deref(), Some("AAPL"));
    assert_eq!(outcome.diagnostics.len(), 1);
}

#[tokio::test]
async fn when_ticker_is_unknown_stderr_is_surfaced() {
    let fixture = fixture(ANALYSIS_SCRIPT);

    let error = fixture
        .pipeline(Duration::from_secs(10))
        .run(&request("ZZZZ", Interval::OneDay))
        .await
        .expect_err("run fails");

    assert_eq!(error.kind(), PipelineErrorKind::FetchFailed);
    assert_eq!(error.to_string(), "fetch step failed: ticker not found");
}

#[tokio::test]
async fn when_fetch_writes_nothing_output_is_missing() {
    let fixture = fixture(ANALYSIS_SCRIPT);

    let error = fixture
        .pipeline(Duration::from_secs(10))
        .run(&request("EMPTY", Interval::OneHour))
        .await
        .expect_err("run fails");

    assert_eq!(error.kind(), PipelineErrorKind::OutputMissing);
    assert_eq!(
        error.to_string(),
        "fetch step output not found: stock_data_1h.csv"
    );
}

#[tokio::test]
async fn when_analysis_exceeds_timeout_child_is_killed_and_run_fails() {
    // Given: An analysis script that never finishes on its own
    let fixture = fixture(HANGING_SCRIPT);
    let started = Instant::now();

    // When: The run is limited to one second per step
    let error = fixture
        .pipeline(Duration::from_secs(1))
        .run(&request("AAPL", Interval::OneDay))
        .await
        .expect_err("run fails");

    // Then: The run fails with a timeout well before the script would exit
    assert_eq!(error.kind(), PipelineErrorKind::StepTimedOut);
    assert_eq!(error.to_string(), "analysis step timed out after 1s");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn when_step_program_does_not_exist_spawn_failure_is_reported() {
    let fixture = fixture(ANALYSIS_SCRIPT);
    let pipeline = Pipeline::with_processes(PipelineConfig {
        fetch_command: StepCommand::new("/nonexistent/bandwatch-fetch", Vec::new())
            .expect("command"),
        work_root: fixture.work.path().to_path_buf(),
        ..PipelineConfig::default()
    });

    let error = pipeline
        .run(&request("AAPL", Interval::OneDay))
        .await
        .expect_err("run fails");

    assert_eq!(error.kind(), PipelineErrorKind::ProcessSpawn);
    assert!(error
        .to_string()
        .starts_with("fetch step could not be started (/nonexistent/bandwatch-fetch)"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_instruments_on_same_interval_do_not_share_artifacts() {
    // Given: One pipeline shared by several in-flight requests
    let fixture = fixture(ANALYSIS_SCRIPT);
    let pipeline = Arc::new(fixture.pipeline(Duration::from_secs(10)));
    let tickers = ["AAPL", "MSFT", "RELIANCE.NS", "INFY.NS"];

    // When: All of them request daily data at once
    let mut runs = tokio::task::JoinSet::new();
    for ticker in tickers {
        let pipeline = Arc::clone(&pipeline);
        runs.spawn(async move {
            let request = request(ticker, Interval::OneDay);
            (request.instrument.to_string(), pipeline.run(&request).await)
        });
    }

    // Then: Each response carries the rows fetched for its own instrument
    let mut completed = 0;
    while let Some(joined) = runs.join_next().await {
        let (instrument, result) = joined.expect("run task completes");
        let outcome = result.expect("run succeeds");
        assert_eq!(
            outcome.points[0].record.open.as_deref(),
            Some(instrument.as_str())
        );
        completed += 1;
    }
    assert_eq!(completed, tickers.len());

    // And: No run directories are left behind
    let leftovers = std::fs::read_dir(fixture.work.path())
        .expect("read work dir")
        .count();
    assert_eq!(leftovers, 0);
}

// =============================================================================
// Process runner
// =============================================================================

#[tokio::test]
async fn process_runner_captures_exit_code_and_both_streams() {
    let dir = tempfile::tempdir().expect("dir");
    let command = StepCommand::new(
        "sh",
        vec![
            String::from("-c"),
            String::from("echo out; echo err >&2; exit 4"),
        ],
    )
    .expect("command");

    let output = ProcessStepRunner
        .run(StepInvocation::new(Step::Analysis, &command, Vec::new(), dir.path()))
        .await
        .expect("step runs");

    assert_eq!(output.exit_code, Some(4));
    assert_eq!(output.stdout, "out\n");
    assert_eq!(output.stderr, "err\n");
    assert_eq!(output.diagnostics(), "err");
}

#[tokio::test]
async fn process_runner_reports_signal_termination_without_exit_code() {
    let dir = tempfile::tempdir().expect("dir");
    let command = StepCommand::new("sh", vec![String::from("-c"), String::from("kill -9 $$")])
        .expect("command");

    let output = ProcessStepRunner
        .run(StepInvocation::new(Step::Fetch, &command, Vec::new(), dir.path()))
        .await
        .expect("step runs");

    assert_eq!(output.exit_code, None);
    assert!(!output.success());
    assert_eq!(output.diagnostics(), "terminated by signal");
}

#[tokio::test]
async fn process_runner_times_out_long_running_steps() {
    let dir = tempfile::tempdir().expect("dir");
    let command = StepCommand::new("sh", vec![String::from("-c"), String::from("sleep 30")])
        .expect("command");
    let invocation = StepInvocation::new(Step::Fetch, &command, Vec::new(), dir.path())
        .with_timeout(Duration::from_millis(200));

    let error = ProcessStepRunner
        .run(invocation)
        .await
        .expect_err("step times out");

    assert!(matches!(error, StepError::TimedOut { timeout } if timeout == Duration::from_millis(200)));
}
