//! Data types for the sleep disorder prediction pipeline

pub mod evaluation;
pub mod features;
pub mod prediction;

pub use evaluation::EvaluationMetrics;
pub use features::FeatureVector;
pub use prediction::{PredictionResult, SleepDisorder};
