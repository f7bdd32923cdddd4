//! Sleep Disorder Predictor Library
//!
//! Classifies health and lifestyle inputs into a sleep disorder category with
//! a pre-trained ONNX model and renders the result as HTML or a PDF report.

pub mod config;
pub mod error;
pub mod feature_builder;
pub mod metrics;
pub mod models;
pub mod report;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{PredictionError, RenderError, ValidationError};
pub use feature_builder::FeatureBuilder;
pub use models::inference::{Classifier, PredictionService};
pub use server::{router, AppState};
pub use types::{EvaluationMetrics, FeatureVector, PredictionResult, SleepDisorder};
