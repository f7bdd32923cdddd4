//! Builds model input vectors from submitted form fields.
//!
//! Fields are parsed in the exact column order used when the classifier was
//! trained. Any missing or malformed field rejects the whole submission.

use crate::error::{ValidationError, ValidationReason};
use crate::types::features::{FeatureVector, FEATURE_COUNT};
use std::collections::HashMap;

/// Declared type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
}

/// A form field and the feature it feeds
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name of the form field as submitted
    pub form_name: &'static str,
    /// Name of the model feature
    pub feature_name: &'static str,
    pub kind: FieldKind,
}

const fn field(form_name: &'static str, feature_name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        form_name,
        feature_name,
        kind,
    }
}

/// Form fields in training column order
pub const FIELDS: [FieldSpec; FEATURE_COUNT] = [
    field("gender", "gender", FieldKind::Integer),
    field("age", "age", FieldKind::Integer),
    field("occupation", "occupation", FieldKind::Integer),
    field("sleep_duration", "sleep_duration", FieldKind::Float),
    field("quality", "quality", FieldKind::Integer),
    field("stress", "stress", FieldKind::Integer),
    field("bmi", "bmi", FieldKind::Integer),
    field("heart", "heart_rate", FieldKind::Integer),
    field("sys", "systolic_bp", FieldKind::Integer),
    field("dia", "diastolic_bp", FieldKind::Integer),
];

/// Turns submitted form fields into a [`FeatureVector`].
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Create a new feature builder.
    pub fn new() -> Self {
        Self
    }

    /// Build a feature vector from form fields.
    ///
    /// Stops at the first field (in column order) that is missing or does not
    /// parse as its declared type.
    pub fn build(&self, form: &HashMap<String, String>) -> Result<FeatureVector, ValidationError> {
        // struct fields are evaluated in source order, which is column order
        Ok(FeatureVector {
            gender: parse_int(&FIELDS[0], form)?,
            age: parse_int(&FIELDS[1], form)?,
            occupation: parse_int(&FIELDS[2], form)?,
            sleep_duration: parse_float(&FIELDS[3], form)?,
            quality: parse_int(&FIELDS[4], form)?,
            stress: parse_int(&FIELDS[5], form)?,
            bmi: parse_int(&FIELDS[6], form)?,
            heart_rate: parse_int(&FIELDS[7], form)?,
            systolic_bp: parse_int(&FIELDS[8], form)?,
            diastolic_bp: parse_int(&FIELDS[9], form)?,
        })
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> Vec<&'static str> {
        FIELDS.iter().map(|f| f.feature_name).collect()
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw submitted value, trimmed. Blank counts as missing.
fn raw_value<'a>(
    spec: &FieldSpec,
    form: &'a HashMap<String, String>,
) -> Result<(&'a str, &'a str), ValidationError> {
    let raw = form
        .get(spec.form_name)
        .ok_or_else(|| ValidationError::missing(spec.form_name))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::invalid(
            spec.form_name,
            raw,
            ValidationReason::Missing,
        ));
    }
    Ok((raw, trimmed))
}

fn parse_int(spec: &FieldSpec, form: &HashMap<String, String>) -> Result<i64, ValidationError> {
    debug_assert_eq!(spec.kind, FieldKind::Integer);
    let (raw, trimmed) = raw_value(spec, form)?;
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid(spec.form_name, raw, ValidationReason::NotAnInteger))
}

fn parse_float(spec: &FieldSpec, form: &HashMap<String, String>) -> Result<f64, ValidationError> {
    debug_assert_eq!(spec.kind, FieldKind::Float);
    let (raw, trimmed) = raw_value(spec, form)?;
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::invalid(spec.form_name, raw, ValidationReason::NotANumber))?;
    if !value.is_finite() {
        return Err(ValidationError::invalid(
            spec.form_name,
            raw,
            ValidationReason::NotFinite,
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> HashMap<String, String> {
        [
            ("gender", "1"),
            ("age", "29"),
            ("occupation", "2"),
            ("sleep_duration", "6.5"),
            ("quality", "6"),
            ("stress", "7"),
            ("bmi", "1"),
            ("heart", "72"),
            ("sys", "130"),
            ("dia", "85"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_build_sample() {
        let vector = FeatureBuilder::new().build(&sample_form()).unwrap();

        assert_eq!(vector.age, 29);
        assert_eq!(vector.sleep_duration, 6.5);
        assert_eq!(vector.heart_rate, 72);
        assert_eq!(vector.systolic_bp, 130);
        assert_eq!(vector.diastolic_bp, 85);
    }

    #[test]
    fn test_feature_count() {
        let builder = FeatureBuilder::new();
        assert_eq!(builder.feature_count(), 10);
        assert_eq!(builder.feature_names().len(), 10);
        assert_eq!(builder.feature_names()[7], "heart_rate");
    }

    #[test]
    fn test_every_missing_field_is_named() {
        let builder = FeatureBuilder::new();
        for spec in FIELDS {
            let mut form = sample_form();
            form.remove(spec.form_name);

            let err = builder.build(&form).unwrap_err();
            assert_eq!(err, ValidationError::missing(spec.form_name));
        }
    }

    #[test]
    fn test_missing_age() {
        let mut form = sample_form();
        form.remove("age");

        let err = FeatureBuilder::new().build(&form).unwrap_err();
        assert_eq!(err.field, "age");
        assert_eq!(err.reason, ValidationReason::Missing);
        assert!(err.raw.is_none());
    }

    #[test]
    fn test_rejects_non_integer() {
        let mut form = sample_form();
        form.insert("stress".into(), "7.5".into());

        let err = FeatureBuilder::new().build(&form).unwrap_err();
        assert_eq!(err.field, "stress");
        assert_eq!(err.raw.as_deref(), Some("7.5"));
        assert_eq!(err.reason, ValidationReason::NotAnInteger);
    }

    #[test]
    fn test_rejects_bad_float() {
        let builder = FeatureBuilder::new();

        let mut form = sample_form();
        form.insert("sleep_duration".into(), "lots".into());
        assert_eq!(
            builder.build(&form).unwrap_err().reason,
            ValidationReason::NotANumber
        );

        form.insert("sleep_duration".into(), "NaN".into());
        assert_eq!(
            builder.build(&form).unwrap_err().reason,
            ValidationReason::NotFinite
        );
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let mut form = sample_form();
        form.insert("dia".into(), "   ".into());

        let err = FeatureBuilder::new().build(&form).unwrap_err();
        assert_eq!(err.field, "dia");
        assert_eq!(err.reason, ValidationReason::Missing);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let mut form = sample_form();
        form.insert("age".into(), " 41 ".into());
        form.insert("sleep_duration".into(), "7 ".into());

        let vector = FeatureBuilder::new().build(&form).unwrap();
        assert_eq!(vector.age, 41);
        assert_eq!(vector.sleep_duration, 7.0);
    }

    #[test]
    fn test_declared_kinds_match_vector_fields() {
        let floats: Vec<_> = FIELDS
            .iter()
            .filter(|f| f.kind == FieldKind::Float)
            .map(|f| f.form_name)
            .collect();
        assert_eq!(floats, vec!["sleep_duration"]);
        assert_eq!(FIELDS[3].form_name, "sleep_duration");
    }

    #[test]
    fn test_integer_fields_keep_exact_values() {
        let mut form = sample_form();
        form.insert("sys".into(), "9007199254740993".into());

        let vector = FeatureBuilder::new().build(&form).unwrap();
        assert_eq!(vector.systolic_bp, 9_007_199_254_740_993);
        assert_eq!(vector.gender, 1);
        assert_eq!(vector.sleep_duration, 6.5);
    }

    #[test]
    fn test_first_bad_field_in_column_order_wins() {
        let mut form = sample_form();
        form.remove("dia");
        form.insert("gender".into(), "x".into());

        assert_eq!(FeatureBuilder::new().build(&form).unwrap_err().field, "gender");
    }
}
