//! Configuration management for the sleep disorder predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable that overrides the configuration file location
pub const CONFIG_PATH_ENV: &str = "SLEEP_PREDICTOR_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Seconds between service metrics summaries (0 disables the reporter)
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

/// Model bundle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the exported model and its evaluation metrics
    pub bundle_dir: String,
    /// ONNX file name inside the bundle
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Metrics JSON file name inside the bundle
    #[serde(default = "default_metrics_file")]
    pub metrics_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Override for the model input name (detected when absent)
    #[serde(default)]
    pub input_name: Option<String>,
    /// Override for the label output name (detected when absent)
    #[serde(default)]
    pub label_output: Option<String>,
    /// Override for the probability output name (detected when absent)
    #[serde(default)]
    pub probability_output: Option<String>,
}

/// Report rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Title printed at the top of the PDF
    #[serde(default = "default_report_title")]
    pub title: String,
    /// Footnote printed under the metrics
    #[serde(default = "default_disclaimer")]
    pub disclaimer: String,
    /// File name offered to the browser
    #[serde(default = "default_download_name")]
    pub download_name: String,
    /// When set, every generated report is also kept here under a unique name
    #[serde(default)]
    pub archive_dir: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_metrics_interval() -> u64 {
    60
}

fn default_model_file() -> String {
    "model.onnx".to_string()
}

fn default_metrics_file() -> String {
    "metrics.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_report_title() -> String {
    "Sleep Disorder Prediction Report".to_string()
}

fn default_disclaimer() -> String {
    "This report is generated using the trained Voting Ensemble Model for Sleep Disorder \
     Prediction. Metrics are dynamically loaded from offline evaluation."
        .to_string()
}

fn default_download_name() -> String {
    "sleep_disorder_report.pdf".to_string()
}

impl ModelConfig {
    /// Full path of the ONNX model file
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.bundle_dir).join(&self.model_file)
    }

    /// Full path of the metrics file
    pub fn metrics_path(&self) -> PathBuf {
        Path::new(&self.bundle_dir).join(&self.metrics_file)
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl AppConfig {
    /// Load configuration from the default file, or the one named by
    /// `SLEEP_PREDICTOR_CONFIG`
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// Values may be overridden with `SLEEP_PREDICTOR__<SECTION>__<KEY>`
    /// environment variables, e.g. `SLEEP_PREDICTOR__SERVER__PORT=8080`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SLEEP_PREDICTOR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                metrics_interval_secs: default_metrics_interval(),
            },
            model: ModelConfig {
                bundle_dir: "model_bundle".to_string(),
                model_file: default_model_file(),
                metrics_file: default_metrics_file(),
                onnx_threads: default_onnx_threads(),
                input_name: None,
                label_output: None,
                probability_output: None,
            },
            report: ReportConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            disclaimer: default_disclaimer(),
            download_name: default_download_name(),
            archive_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.report.download_name, "sleep_disorder_report.pdf");
        assert!(config.report.archive_dir.is_none());
    }

    #[test]
    fn test_bundle_paths() {
        let config = AppConfig::default();
        assert_eq!(
            config.model.model_path(),
            Path::new("model_bundle").join("model.onnx")
        );
        assert_eq!(
            config.model.metrics_path(),
            Path::new("model_bundle").join("metrics.json")
        );
    }

    #[test]
    fn test_load_minimal_file_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 8080

[model]
bundle_dir = "/srv/bundle"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.metrics_interval_secs, 60);
        assert_eq!(config.model.model_file, "model.onnx");
        assert_eq!(config.report.title, "Sleep Disorder Prediction Report");
        assert!(config.report.disclaimer.contains("offline evaluation"));
        assert_eq!(config.logging.format, "json");
    }
}
