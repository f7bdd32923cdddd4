//! Request handlers

use crate::metrics::MetricsSnapshot;
use crate::report::ReportView;
use crate::server::{ApiError, AppState};
use crate::types::evaluation::EvaluationMetrics;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Home page with the input form
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.pages.index()?))
}

/// Classify a form submission and render the report page
pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    let start_time = Instant::now();

    let Form(form) = form.inspect_err(|_| state.metrics.record_validation_failure())?;

    let features = state
        .features
        .build(&form)
        .inspect_err(|_| state.metrics.record_validation_failure())?;

    let predictor = state.predictor.clone();
    let outcome = tokio::task::spawn_blocking(move || predictor.predict(&features)).await?;
    let result = outcome.inspect_err(|_| state.metrics.record_prediction_failure())?;

    let elapsed = start_time.elapsed();
    state.metrics.record_prediction(elapsed, result.label);

    info!(
        label = %result.label,
        confidence = result.confidence,
        latency_us = elapsed.as_micros() as u64,
        "Prediction served"
    );

    let view = ReportView::new(&result, &state.evaluation);
    Ok(Html(state.pages.report(&view)?))
}

/// Generate the PDF report and send it as an attachment
pub async fn download(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reports = state.reports.clone();
    let evaluation = state.evaluation.clone();

    let rendered = tokio::task::spawn_blocking(move || reports.render(&evaluation))
        .await?
        .inspect_err(|_| state.metrics.record_render_failure())?;

    state.metrics.record_report();
    info!(report_id = %rendered.id, size = rendered.bytes.len(), "Report downloaded");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.reports.download_name()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// Service status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub evaluation: EvaluationMetrics,
    pub metrics: MetricsSnapshot,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.predictor.model_name().to_string(),
        evaluation: *state.evaluation,
        metrics: state.metrics.snapshot(),
    })
}
