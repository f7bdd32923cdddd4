//! Sleep Disorder Predictor - Main Entry Point
//!
//! Loads the model bundle once and serves the prediction form, report pages
//! and PDF downloads over HTTP.

use anyhow::{Context, Result};
use sleep_disorder_predictor::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{ModelBundle, PredictionService},
    router, AppState, FeatureBuilder,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("sleep_disorder_predictor={},tower_http=info", logging.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting Sleep Disorder Predictor");

    // Load model and evaluation metrics once; both stay read-only afterwards
    let bundle = ModelBundle::load(&config.model)?;
    let predictor = PredictionService::new(Arc::new(bundle.classifier));
    info!(model = %predictor.model_name(), "Prediction service initialized");

    let features = FeatureBuilder::new();
    info!(
        "Feature builder initialized ({} features): {:?}",
        features.feature_count(),
        features.feature_names()
    );

    let metrics = Arc::new(ServiceMetrics::new());
    if config.server.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.server.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(predictor, bundle.metrics, config.report.clone(), metrics.clone())
        .context("Failed to prepare page templates")?;

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Print final summary
    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}
