use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bandwatch_core::{
    today_utc, Instrument, Interval, PipelineError, PipelineErrorKind, PipelineRequest, StepRunner,
};
use serde::Deserialize;

use crate::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const ROW_DIAGNOSTICS_HEADER: &str = "x-row-diagnostics";
pub const ERROR_CODE_HEADER: &str = "x-error-code";

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub ticker: Option<String>,
    pub interval: Option<String>,
}

/// `GET /api/data?ticker=<instrument>&interval=<1h|1d>`
pub async fn get_data<R: StepRunner + 'static>(
    State(state): State<AppState<R>>,
    Query(query): Query<DataQuery>,
) -> Response {
    let instrument = match Instrument::parse(query.ticker.as_deref().unwrap_or_default()) {
        Ok(instrument) => instrument,
        Err(error) => {
            tracing::info!(ticker = ?query.ticker, %error, "rejected request");
            return (StatusCode::BAD_REQUEST, format!("invalid ticker: {error}")).into_response();
        }
    };

    let (interval, fell_back) = Interval::resolve_or_daily(query.interval.as_deref());
    if fell_back {
        tracing::warn!(requested = ?query.interval, %interval, "unrecognized interval, using daily");
    }

    let end = state.end_date.unwrap_or_else(today_utc);
    let request = match PipelineRequest::new(
        instrument,
        interval,
        end,
        &state.pipeline.config().window_policy,
    ) {
        Ok(request) => request,
        Err(error) => {
            // Derived from server settings only, never from the query.
            tracing::error!(%interval, %end, %error, "configured lookback yields no date window");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid date window: {error}"),
            )
                .into_response();
        }
    };

    match state.pipeline.run(&request).await {
        Ok(outcome) => (
            [
                (REQUEST_ID_HEADER, outcome.request_id.to_string()),
                (ROW_DIAGNOSTICS_HEADER, outcome.diagnostics.len().to_string()),
            ],
            Json(outcome.points),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(
                request_id = %request.request_id,
                instrument = %request.instrument,
                code = error.code(),
                %error,
                "pipeline run failed"
            );
            (
                status_for(&error),
                [
                    (REQUEST_ID_HEADER, request.request_id.to_string()),
                    (ERROR_CODE_HEADER, error.code().to_owned()),
                ],
                error.to_string(),
            )
                .into_response()
        }
    }
}

fn status_for(error: &PipelineError) -> StatusCode {
    match error.kind() {
        PipelineErrorKind::StepTimedOut => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
