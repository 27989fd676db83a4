use std::process::ExitCode;

use bandwatch_core::Pipeline;
use bandwatch_web::{init_tracing, router, AppState, ServerArgs, ServerError};
use clap::Parser;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let args = ServerArgs::parse();
    init_tracing(args.log_filter.as_deref())?;

    let base = std::env::current_dir()?;
    let config = args.pipeline_config(&base)?;
    tracing::info!(
        fetch = %config.fetch_command,
        analysis = %config.analysis_command,
        work_root = %config.work_root.display(),
        timeout_secs = config.step_timeout.as_secs(),
        max_concurrent_runs = config.max_concurrent_runs,
        "pipeline configured"
    );

    let state = AppState::new(Pipeline::with_processes(config), args.end_date);
    let app = router(state, args.static_dir.as_deref());

    let listener = TcpListener::bind(args.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: args.bind,
            source,
        })?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
