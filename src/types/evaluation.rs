//! Offline evaluation metrics shipped with the model

use crate::types::prediction::round2;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scores computed when the model was evaluated offline, stored as fractions
/// in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Metrics expressed as percentages rounded to 2 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricPercentages {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl EvaluationMetrics {
    /// Read metrics from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics from {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid metrics file {}", path.display()))
    }

    /// Parse and validate metrics JSON
    pub fn from_json(raw: &str) -> Result<Self> {
        let metrics: Self = serde_json::from_str(raw).context("Failed to parse metrics JSON")?;
        metrics.validate()?;
        Ok(metrics)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in self.named() {
            ensure!(
                value.is_finite() && (0.0..=1.0).contains(&value),
                "metric {name} must be a fraction in [0, 1], got {value}"
            );
        }
        Ok(())
    }

    fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
        ]
    }

    pub fn as_percentages(&self) -> MetricPercentages {
        MetricPercentages {
            accuracy: round2(self.accuracy * 100.0),
            precision: round2(self.precision * 100.0),
            recall: round2(self.recall * 100.0),
            f1: round2(self.f1 * 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages() {
        let metrics = EvaluationMetrics {
            accuracy: 0.9333333,
            precision: 0.92,
            recall: 0.9166666,
            f1: 0.918,
        };
        let pct = metrics.as_percentages();
        assert_eq!(pct.accuracy, 93.33);
        assert_eq!(pct.precision, 92.0);
        assert_eq!(pct.recall, 91.67);
        assert_eq!(pct.f1, 91.8);
    }

    #[test]
    fn test_from_json() {
        let metrics =
            EvaluationMetrics::from_json(r#"{"accuracy":0.9,"precision":0.8,"recall":0.7,"f1":0.75}"#)
                .unwrap();
        assert_eq!(metrics.recall, 0.7);
    }

    #[test]
    fn test_rejects_out_of_range_metric() {
        let err =
            EvaluationMetrics::from_json(r#"{"accuracy":93.3,"precision":0.8,"recall":0.7,"f1":0.75}"#)
                .unwrap_err();
        assert!(err.to_string().contains("accuracy"));
    }

    #[test]
    fn test_rejects_missing_metric() {
        assert!(EvaluationMetrics::from_json(r#"{"accuracy":0.9}"#).is_err());
    }
}
