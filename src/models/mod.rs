//! ML model loading and inference components

pub mod inference;
pub mod loader;

pub use inference::{Classifier, OnnxClassifier, PredictionService};
pub use loader::{ModelBundle, ModelLoader};
