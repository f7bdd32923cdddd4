//! Error kinds surfaced by the prediction pipeline

use thiserror::Error;

/// Why a form field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    NotAnInteger,
    NotANumber,
    NotFinite,
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ValidationReason::Missing => "is missing",
            ValidationReason::NotAnInteger => "must be an integer",
            ValidationReason::NotANumber => "must be a number",
            ValidationReason::NotFinite => "must be a finite number",
        };
        f.write_str(text)
    }
}

/// A form field was missing or could not be parsed into its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` {reason}{}", raw_suffix(.raw))]
pub struct ValidationError {
    /// Form field name as submitted
    pub field: &'static str,
    /// Raw submitted value, `None` when the field was absent
    pub raw: Option<String>,
    pub reason: ValidationReason,
}

fn raw_suffix(raw: &Option<String>) -> String {
    match raw {
        Some(value) => format!(" (got {value:?})"),
        None => String::new(),
    }
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            raw: None,
            reason: ValidationReason::Missing,
        }
    }

    pub fn invalid(field: &'static str, raw: &str, reason: ValidationReason) -> Self {
        Self {
            field,
            raw: Some(raw.to_string()),
            reason,
        }
    }
}

/// Failures while running the classifier
#[derive(Debug, Error)]
pub enum PredictionError {
    /// The model returned a class index outside the known label set
    #[error("model returned unknown class index {index}")]
    InvalidModelOutput { index: i64 },

    /// The model returned probabilities that cannot be a distribution
    #[error("model returned unusable class probabilities: {0}")]
    InvalidProbabilities(String),

    /// The model itself failed
    #[error("model inference failed: {0:#}")]
    Inference(#[source] anyhow::Error),
}

impl PredictionError {
    /// True when the model broke its output contract rather than failing to run
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            PredictionError::InvalidModelOutput { .. } | PredictionError::InvalidProbabilities(_)
        )
    }
}

/// Failures while producing the downloadable report
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build PDF document: {0}")]
    Pdf(String),

    #[error("failed to render page template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to write report to {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::missing("age").to_string(),
            "field `age` is missing"
        );
        assert_eq!(
            ValidationError::invalid("heart", "fast", ValidationReason::NotAnInteger).to_string(),
            "field `heart` must be an integer (got \"fast\")"
        );
    }

    #[test]
    fn test_contract_violation() {
        assert!(PredictionError::InvalidModelOutput { index: 7 }.is_contract_violation());
        assert!(
            !PredictionError::Inference(anyhow::anyhow!("session closed")).is_contract_violation()
        );
    }
}
