//! HTML pages rendered from embedded templates

use crate::error::RenderError;
use crate::feature_builder::{FieldKind, FIELDS};
use crate::report::view::ReportView;
use minijinja::{context, Environment};
use serde::Serialize;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");

/// One input on the home page form
#[derive(Debug, Serialize)]
struct FormField {
    name: &'static str,
    label: &'static str,
    step: &'static str,
}

fn field_label(form_name: &str) -> &'static str {
    match form_name {
        "gender" => "Gender (code)",
        "age" => "Age",
        "occupation" => "Occupation (code)",
        "sleep_duration" => "Sleep Duration (hours)",
        "quality" => "Quality of Sleep (1-10)",
        "stress" => "Stress Level (1-10)",
        "bmi" => "BMI Category (code)",
        "heart" => "Heart Rate (bpm)",
        "sys" => "Systolic BP",
        "dia" => "Diastolic BP",
        _ => "Value",
    }
}

/// Renders the home and report pages.
///
/// Templates are parsed once; `.html` templates are auto-escaped.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;
        env.add_template("report.html", REPORT_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Home page with the input form
    pub fn index(&self) -> Result<String, RenderError> {
        let fields: Vec<FormField> = FIELDS
            .iter()
            .map(|f| FormField {
                name: f.form_name,
                label: field_label(f.form_name),
                step: match f.kind {
                    FieldKind::Integer => "1",
                    FieldKind::Float => "0.1",
                },
            })
            .collect();

        let template = self.env.get_template("index.html")?;
        Ok(template.render(context! { fields => fields })?)
    }

    /// Result page for one prediction
    pub fn report(&self, view: &ReportView) -> Result<String, RenderError> {
        let template = self.env.get_template("report.html")?;
        Ok(template.render(context! {
            prediction => view.prediction,
            confidence => format!("{:.2}", view.confidence),
            accuracy => format!("{:.2}", view.metrics.accuracy),
            precision => format!("{:.2}", view.metrics.precision),
            recall => format!("{:.2}", view.metrics.recall),
            f1 => format!("{:.2}", view.metrics.f1),
        })?)
    }
}
