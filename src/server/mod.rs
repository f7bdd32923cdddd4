//! HTTP surface: routes, shared state and error mapping

pub mod error;
pub mod handlers;

use crate::config::ReportConfig;
use crate::error::RenderError;
use crate::feature_builder::FeatureBuilder;
use crate::metrics::ServiceMetrics;
use crate::models::inference::PredictionService;
use crate::report::{PageRenderer, ReportWriter};
use crate::types::evaluation::EvaluationMetrics;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Everything a handler needs, loaded once at startup and shared read-only
#[derive(Clone)]
pub struct AppState {
    pub features: Arc<FeatureBuilder>,
    pub predictor: PredictionService,
    pub evaluation: Arc<EvaluationMetrics>,
    pub pages: Arc<PageRenderer>,
    pub reports: Arc<ReportWriter>,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(
        predictor: PredictionService,
        evaluation: EvaluationMetrics,
        report: ReportConfig,
        metrics: Arc<ServiceMetrics>,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            features: Arc::new(FeatureBuilder::new()),
            predictor,
            evaluation: Arc::new(evaluation),
            pages: Arc::new(PageRenderer::new()?),
            reports: Arc::new(ReportWriter::new(report)),
            metrics,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict))
        .route("/download", get(handlers::download))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
