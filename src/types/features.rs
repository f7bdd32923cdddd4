//! Model input record

use serde::Serialize;

/// Number of features the classifier was trained on
pub const FEATURE_COUNT: usize = 10;

/// One person's inputs, encoded the way the training data was.
///
/// Categorical fields (`gender`, `occupation`, `bmi`) carry the integer codes
/// produced by the label encoders used during training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub gender: i64,
    pub age: i64,
    pub occupation: i64,
    /// Hours of sleep per day
    pub sleep_duration: f64,
    /// Self-reported quality of sleep
    pub quality: i64,
    /// Self-reported stress level
    pub stress: i64,
    pub bmi: i64,
    /// Resting heart rate (bpm)
    pub heart_rate: i64,
    pub systolic_bp: i64,
    pub diastolic_bp: i64,
}

impl FeatureVector {
    /// Model input in training column order.
    pub fn to_model_input(&self) -> [f32; FEATURE_COUNT] {
        [
            self.gender as f32,
            self.age as f32,
            self.occupation as f32,
            self.sleep_duration as f32,
            self.quality as f32,
            self.stress as f32,
            self.bmi as f32,
            self.heart_rate as f32,
            self.systolic_bp as f32,
            self.diastolic_bp as f32,
        ]
    }
}
