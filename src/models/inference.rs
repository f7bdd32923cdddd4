//! Classifier abstraction, ONNX adapter and the prediction service

use crate::error::PredictionError;
use crate::models::loader::LoadedModel;
use crate::types::features::FeatureVector;
use crate::types::prediction::{round2, PredictionResult, SleepDisorder};
use anyhow::{anyhow, Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tolerance when checking that probabilities lie in `[0, 1]`
const PROBABILITY_EPSILON: f64 = 1e-6;

/// A trained classifier that maps a feature row to a class.
///
/// `features` is always one row in training column order.
pub trait Classifier: Send + Sync {
    /// Predicted class index
    fn classify(&self, features: &[f32]) -> Result<i64>;

    /// Probability of every class, ordered by class index
    fn class_probabilities(&self, features: &[f32]) -> Result<Vec<f64>>;

    /// Class index and probabilities together. Adapters that get both from a
    /// single run should override this.
    fn infer(&self, features: &[f32]) -> Result<(i64, Vec<f64>)> {
        Ok((self.classify(features)?, self.class_probabilities(features)?))
    }

    /// Name used in logs
    fn name(&self) -> &str {
        "classifier"
    }
}

/// [`Classifier`] backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so runs are serialised.
pub struct OnnxClassifier {
    name: String,
    model: Mutex<LoadedModel>,
}

impl OnnxClassifier {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            name: model.name.clone(),
            model: Mutex::new(model),
        }
    }

    fn run(&self, features: &[f32]) -> Result<(i64, Vec<f64>)> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        let model = &mut *model;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])?;

        let label_value = outputs
            .get(model.label_output.as_str())
            .ok_or_else(|| anyhow!("Model has no output named {}", model.label_output))?;
        let (_, labels) = label_value
            .try_extract_tensor::<i64>()
            .context("Label output is not an int64 tensor")?;
        let label = *labels.first().ok_or_else(|| anyhow!("Empty label output"))?;

        let prob_value = outputs
            .get(model.probability_output.as_str())
            .ok_or_else(|| anyhow!("Model has no output named {}", model.probability_output))?;
        let probabilities = extract_probabilities(prob_value, &model.name)?;

        debug!(model = %model.name, label = label, probabilities = ?probabilities, "Model run complete");

        Ok((label, probabilities))
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, features: &[f32]) -> Result<i64> {
        self.run(features).map(|(label, _)| label)
    }

    fn class_probabilities(&self, features: &[f32]) -> Result<Vec<f64>> {
        self.run(features).map(|(_, probabilities)| probabilities)
    }

    fn infer(&self, features: &[f32]) -> Result<(i64, Vec<f64>)> {
        self.run(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Extract per-class probabilities from a model output.
/// Handles both plain tensors (`zipmap=False` exports) and the `seq(map(int64, float))`
/// output that skl2onnx produces by default.
fn extract_probabilities(output: &ort::value::DynValue, model_name: &str) -> Result<Vec<f64>> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let classes = match dims.as_slice() {
            [_, classes] | [classes] => *classes as usize,
            _ => data.len(),
        };
        debug!(model = %model_name, classes = classes, "Extracted from tensor");
        return Ok(data.iter().take(classes).map(|&p| p as f64).collect());
    }

    let dtype = output.dtype();
    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output, model_name);
    }

    Err(anyhow!("Unsupported probability output type: {:?}", dtype))
}

/// Extract probabilities from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &ort::value::DynValue, model_name: &str) -> Result<Vec<f64>> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // batch_size is always 1
    let map_value = maps.first().ok_or_else(|| anyhow!("Empty sequence"))?;
    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    let classes = kv_pairs
        .iter()
        .map(|(class_id, _)| *class_id)
        .max()
        .ok_or_else(|| anyhow!("No probability found in map"))?;
    if classes < 0 {
        return Err(anyhow!("Negative class id in probability map"));
    }

    let mut probabilities = vec![0.0; classes as usize + 1];
    for (class_id, prob) in &kv_pairs {
        if *class_id >= 0 {
            probabilities[*class_id as usize] = *prob as f64;
        }
    }

    debug!(model = %model_name, classes = probabilities.len(), "Extracted from seq(map)");
    Ok(probabilities)
}

/// Runs the classifier and maps its output onto the sleep disorder labels.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    /// Classify one feature vector.
    ///
    /// Confidence is the largest class probability as a percentage.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictionError> {
        let input = features.to_model_input();
        let (index, probabilities) = self
            .classifier
            .infer(&input)
            .map_err(PredictionError::Inference)?;

        let label = SleepDisorder::from_index(index)?;
        let top = max_probability(&probabilities)?;

        let confidence = round2(top * 100.0).clamp(0.0, 100.0);

        debug!(
            model = %self.classifier.name(),
            label = %label,
            confidence = confidence,
            "Prediction complete"
        );

        Ok(PredictionResult { label, confidence })
    }
}

fn max_probability(probabilities: &[f64]) -> Result<f64, PredictionError> {
    if probabilities.is_empty() {
        return Err(PredictionError::InvalidProbabilities(
            "no class probabilities".to_string(),
        ));
    }

    let range = -PROBABILITY_EPSILON..=1.0 + PROBABILITY_EPSILON;
    if let Some(bad) = probabilities
        .iter()
        .find(|p| !p.is_finite() || !range.contains(*p))
    {
        return Err(PredictionError::InvalidProbabilities(format!(
            "{bad} is not a probability"
        )));
    }

    Ok(probabilities.iter().copied().fold(f64::MIN, f64::max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier {
        label: i64,
        probabilities: Vec<f64>,
        calls: AtomicUsize,
    }

    impl FixedClassifier {
        fn new(label: i64, probabilities: Vec<f64>) -> Self {
            Self {
                label,
                probabilities,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn classify(&self, features: &[f32]) -> Result<i64> {
            assert_eq!(features.len(), 10);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.label)
        }

        fn class_probabilities(&self, _features: &[f32]) -> Result<Vec<f64>> {
            Ok(self.probabilities.clone())
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn classify(&self, _features: &[f32]) -> Result<i64> {
            Err(anyhow!("session closed"))
        }

        fn class_probabilities(&self, _features: &[f32]) -> Result<Vec<f64>> {
            unreachable!()
        }
    }

    fn sample() -> FeatureVector {
        FeatureVector {
            gender: 1,
            age: 29,
            occupation: 2,
            sleep_duration: 6.5,
            quality: 6,
            stress: 7,
            bmi: 1,
            heart_rate: 72,
            systolic_bp: 130,
            diastolic_bp: 85,
        }
    }

    fn service(label: i64, probabilities: Vec<f64>) -> PredictionService {
        PredictionService::new(Arc::new(FixedClassifier::new(label, probabilities)))
    }

    #[test]
    fn test_predict_maps_label_and_confidence() {
        let result = service(1, vec![0.1, 0.823456, 0.076544])
            .predict(&sample())
            .unwrap();

        assert_eq!(result.label, SleepDisorder::Insomnia);
        assert_eq!(result.confidence, 82.35);
    }

    #[test]
    fn test_confidence_bounds() {
        let certain = service(2, vec![0.0, 0.0, 1.0]).predict(&sample()).unwrap();
        assert_eq!(certain.label, SleepDisorder::SleepApnea);
        assert_eq!(certain.confidence, 100.0);

        let split = service(0, vec![1.0 / 3.0; 3]).predict(&sample()).unwrap();
        assert_eq!(split.confidence, 33.33);
    }

    #[test]
    fn test_unknown_label_is_contract_violation() {
        let err = service(3, vec![0.2, 0.3, 0.5]).predict(&sample()).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidModelOutput { index: 3 }));
    }

    #[test]
    fn test_bad_probabilities() {
        assert!(matches!(
            service(0, vec![]).predict(&sample()).unwrap_err(),
            PredictionError::InvalidProbabilities(_)
        ));
        assert!(matches!(
            service(0, vec![f64::NAN, 0.5]).predict(&sample()).unwrap_err(),
            PredictionError::InvalidProbabilities(_)
        ));
        assert!(matches!(
            service(0, vec![1.7, 0.1]).predict(&sample()).unwrap_err(),
            PredictionError::InvalidProbabilities(_)
        ));
    }

    #[test]
    fn test_inference_failure_is_surfaced() {
        let service = PredictionService::new(Arc::new(BrokenClassifier));
        let err = service.predict(&sample()).unwrap_err();

        assert!(matches!(err, PredictionError::Inference(_)));
        assert!(err.to_string().contains("session closed"));
    }

    #[test]
    fn test_default_infer_calls_classifier_once() {
        let classifier = FixedClassifier::new(0, vec![0.9, 0.05, 0.05]);
        let (label, probabilities) = classifier.infer(&[0.0; 10]).unwrap();

        assert_eq!(label, 0);
        assert_eq!(probabilities.len(), 3);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }
}
