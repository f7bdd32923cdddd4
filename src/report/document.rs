//! Downloadable PDF report.
//!
//! Every request builds its own document in memory, so concurrent downloads
//! never share a file. Archiving a copy to disk is optional and uses a unique
//! name per report.

use crate::config::ReportConfig;
use crate::error::RenderError;
use crate::report::view::metric_lines;
use crate::types::evaluation::EvaluationMetrics;
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// A4 portrait
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const NOTE_SIZE: f32 = 10.0;

/// Characters per disclaimer line at `NOTE_SIZE`
const NOTE_WRAP: usize = 95;

const PT_TO_MM: f32 = 0.352_778;

/// Content of one report, independent of how it is encoded
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub metric_lines: Vec<String>,
    pub disclaimer_lines: Vec<String>,
}

impl ReportDocument {
    pub fn new(config: &ReportConfig, metrics: &EvaluationMetrics, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: config.title.clone(),
            generated_at,
            metric_lines: metric_lines(&metrics.as_percentages()).to_vec(),
            disclaimer_lines: wrap_words(&config.disclaimer, NOTE_WRAP),
        }
    }

    /// Encode as a single page PDF
    pub fn to_pdf(&self) -> Result<Vec<u8>, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            self.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Report",
        );

        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        let layer = doc.get_page(page).get_layer(layer);

        // y is measured from the top of the page and flipped when drawing
        let mut y = MARGIN_MM + 7.0;
        let title_x = centered_x(&self.title, TITLE_SIZE, 0.55);
        layer.use_text(
            self.title.as_str(),
            TITLE_SIZE,
            Mm(title_x),
            Mm(PAGE_HEIGHT_MM - y),
            &bold,
        );

        y += 6.0;
        let stamp = format!("Generated {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"));
        layer.use_text(
            stamp.as_str(),
            NOTE_SIZE,
            Mm(centered_x(&stamp, NOTE_SIZE, 0.5)),
            Mm(PAGE_HEIGHT_MM - y),
            &regular,
        );

        y += 14.0;
        for line in &self.metric_lines {
            layer.use_text(line.as_str(), BODY_SIZE, Mm(MARGIN_MM), Mm(PAGE_HEIGHT_MM - y), &regular);
            y += 8.0;
        }

        y += 10.0;
        for line in &self.disclaimer_lines {
            layer.use_text(line.as_str(), NOTE_SIZE, Mm(MARGIN_MM), Mm(PAGE_HEIGHT_MM - y), &italic);
            y += 6.0;
        }

        doc.save_to_bytes().map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

/// Approximate left edge for centred text, from an average glyph width in em
fn centered_x(text: &str, size: f32, avg_em: f32) -> f32 {
    let width = text.chars().count() as f32 * size * avg_em * PT_TO_MM;
    ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A finished report
#[derive(Debug)]
pub struct RenderedReport {
    pub id: Uuid,
    pub bytes: Vec<u8>,
    /// Where the archived copy was written, if archiving is enabled
    pub archived_at: Option<PathBuf>,
}

/// Produces PDF reports for the loaded metrics
#[derive(Debug, Clone)]
pub struct ReportWriter {
    config: ReportConfig,
}

impl ReportWriter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// File name offered to the browser
    pub fn download_name(&self) -> &str {
        &self.config.download_name
    }

    /// Document content for the given metrics
    pub fn document(&self, metrics: &EvaluationMetrics) -> ReportDocument {
        ReportDocument::new(&self.config, metrics, Utc::now())
    }

    /// Build the PDF and, when configured, archive a copy
    pub fn render(&self, metrics: &EvaluationMetrics) -> Result<RenderedReport, RenderError> {
        let id = Uuid::new_v4();
        let bytes = self.document(metrics).to_pdf()?;

        let archived_at = match &self.config.archive_dir {
            Some(dir) => Some(archive(Path::new(dir), id, &bytes)?),
            None => None,
        };

        debug!(report_id = %id, size = bytes.len(), "Report rendered");

        Ok(RenderedReport {
            id,
            bytes,
            archived_at,
        })
    }
}

/// Write `bytes` under a name unique to this report. The file only appears
/// under its final name once fully written.
fn archive(dir: &Path, id: Uuid, bytes: &[u8]) -> Result<PathBuf, RenderError> {
    let target = dir.join(format!("sleep_disorder_report-{id}.pdf"));
    let partial = dir.join(format!(".sleep_disorder_report-{id}.pdf.part"));

    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| RenderError::Archive { path, source }
    };

    std::fs::create_dir_all(dir).map_err(io_err(dir))?;
    std::fs::write(&partial, bytes).map_err(io_err(&partial))?;
    std::fs::rename(&partial, &target).map_err(io_err(&target))?;

    info!(report_id = %id, path = %target.display(), "Report archived");
    Ok(target)
}
