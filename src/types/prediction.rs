//! Prediction output types

use crate::error::PredictionError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Sleep disorder classes, in the model's class index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepDisorder {
    None,
    Insomnia,
    SleepApnea,
}

impl SleepDisorder {
    /// Every class, ordered by class index
    pub const ALL: [SleepDisorder; 3] = [
        SleepDisorder::None,
        SleepDisorder::Insomnia,
        SleepDisorder::SleepApnea,
    ];

    /// Map a class index returned by the model to its label
    pub fn from_index(index: i64) -> Result<Self, PredictionError> {
        match index {
            0 => Ok(SleepDisorder::None),
            1 => Ok(SleepDisorder::Insomnia),
            2 => Ok(SleepDisorder::SleepApnea),
            _ => Err(PredictionError::InvalidModelOutput { index }),
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            SleepDisorder::None => "No Sleep Disorder",
            SleepDisorder::Insomnia => "Insomnia",
            SleepDisorder::SleepApnea => "Sleep Apnea",
        }
    }
}

impl fmt::Display for SleepDisorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SleepDisorder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Result of classifying one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: SleepDisorder,
    /// Highest class probability as a percentage, rounded to 2 decimals
    pub confidence: f64,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_lookup() {
        for (index, disorder) in SleepDisorder::ALL.into_iter().enumerate() {
            assert_eq!(SleepDisorder::from_index(index as i64).unwrap(), disorder);
        }
        assert_eq!(SleepDisorder::from_index(1).unwrap().label(), "Insomnia");
        assert_eq!(SleepDisorder::None.to_string(), "No Sleep Disorder");
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        for index in [-1, 3, 42] {
            match SleepDisorder::from_index(index) {
                Err(PredictionError::InvalidModelOutput { index: got }) => assert_eq!(got, index),
                other => panic!("expected InvalidModelOutput, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_serializes_as_label() {
        let result = PredictionResult {
            label: SleepDisorder::SleepApnea,
            confidence: 87.5,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["label"], "Sleep Apnea");
        assert_eq!(json["confidence"], 87.5);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(93.3333), 93.33);
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }
}
