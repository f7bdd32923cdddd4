//! Human readable summary of a prediction

use crate::types::evaluation::{EvaluationMetrics, MetricPercentages};
use crate::types::prediction::PredictionResult;
use serde::Serialize;
use std::fmt;

/// Prediction and evaluation metrics ready for display
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub prediction: &'static str,
    /// Confidence percentage
    pub confidence: f64,
    pub metrics: MetricPercentages,
}

impl ReportView {
    pub fn new(result: &PredictionResult, metrics: &EvaluationMetrics) -> Self {
        Self {
            prediction: result.label.label(),
            confidence: result.confidence,
            metrics: metrics.as_percentages(),
        }
    }
}

/// Labelled metric lines, as printed in text and PDF reports
pub fn metric_lines(metrics: &MetricPercentages) -> [String; 4] {
    [
        format!("Accuracy : {:.2}%", metrics.accuracy),
        format!("Precision: {:.2}%", metrics.precision),
        format!("Recall   : {:.2}%", metrics.recall),
        format!("F1 Score : {:.2}%", metrics.f1),
    ]
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prediction: {}", self.prediction)?;
        writeln!(f, "Confidence: {:.2}%", self.confidence)?;
        for line in metric_lines(&self.metrics) {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::SleepDisorder;

    #[test]
    fn test_text_report() {
        let result = PredictionResult {
            label: SleepDisorder::SleepApnea,
            confidence: 91.5,
        };
        let metrics = EvaluationMetrics {
            accuracy: 0.9333,
            precision: 0.9,
            recall: 0.88888,
            f1: 0.89,
        };

        let text = ReportView::new(&result, &metrics).to_string();
        assert_eq!(
            text,
            "Prediction: Sleep Apnea\n\
             Confidence: 91.50%\n\
             Accuracy : 93.33%\n\
             Precision: 90.00%\n\
             Recall   : 88.89%\n\
             F1 Score : 89.00%\n"
        );
    }
}
