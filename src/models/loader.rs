//! Model bundle loader

use crate::config::ModelConfig;
use crate::models::inference::OnnxClassifier;
use crate::types::evaluation::EvaluationMetrics;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::{info, warn};

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for the predicted class index
    pub label_output: String,
    /// Output name for class probabilities
    pub probability_output: String,
}

/// Optional overrides for names that are otherwise detected from the graph
#[derive(Debug, Clone, Default)]
pub struct IoNames {
    pub input: Option<String>,
    pub label: Option<String>,
    pub probability: Option<String>,
}

impl From<&ModelConfig> for IoNames {
    fn from(config: &ModelConfig) -> Self {
        Self {
            input: config.input_name.clone(),
            label: config.label_output.clone(),
            probability: config.probability_output.clone(),
        }
    }
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load a single ONNX classifier from file
    pub fn load_model<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        names: &IoNames,
    ) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let input_name = names
            .input
            .clone()
            .or_else(|| session.inputs.first().map(|i| i.name.clone()))
            .unwrap_or_else(|| "float_input".to_string());

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        let label_output = names
            .label
            .clone()
            .or_else(|| output_names.iter().find(|n| n.contains("label")).cloned())
            .or_else(|| output_names.first().cloned())
            .unwrap_or_else(|| "output_label".to_string());

        let probability_output = names
            .probability
            .clone()
            .or_else(|| output_names.iter().find(|n| n.contains("prob")).cloned())
            .or_else(|| output_names.last().cloned())
            .unwrap_or_else(|| "output_probability".to_string());

        if label_output == probability_output {
            warn!(
                model = %name,
                output = %label_output,
                "Label and probability outputs resolve to the same tensor"
            );
        }

        info!(
            model = %name,
            input = %input_name,
            label = %label_output,
            probabilities = %probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            label_output,
            probability_output,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifier plus the metrics it was evaluated with, loaded once at startup
pub struct ModelBundle {
    pub classifier: OnnxClassifier,
    pub metrics: EvaluationMetrics,
}

impl ModelBundle {
    /// Load the model and its metrics from the configured bundle directory
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let metrics = EvaluationMetrics::load(config.metrics_path())?;
        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            "Evaluation metrics loaded"
        );

        let name = Path::new(&config.model_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");

        let loader = ModelLoader::with_threads(config.onnx_threads);
        let model = loader
            .load_model(config.model_path(), name, &IoNames::from(config))
            .with_context(|| format!("Failed to load model bundle from {}", config.bundle_dir))?;

        Ok(Self {
            classifier: OnnxClassifier::new(model),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_io_names_from_config() {
        let mut config = AppConfig::default().model;
        config.probability_output = Some("probabilities".to_string());

        let names = IoNames::from(&config);
        assert!(names.input.is_none());
        assert_eq!(names.probability.as_deref(), Some("probabilities"));
    }

    #[test]
    fn test_loader_clamps_threads() {
        assert_eq!(ModelLoader::with_threads(0).onnx_threads, 1);
    }

    #[test]
    fn test_missing_bundle_fails_on_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default().model;
        config.bundle_dir = dir.path().to_string_lossy().into_owned();

        let err = ModelBundle::load(&config).err().unwrap();
        assert!(format!("{err:#}").contains("metrics.json"));
    }
}
