use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::report::ReportSettings;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TIMELINE_COLUMNS: usize = 50;
const MIN_TIMELINE_COLUMNS: usize = 10;

#[derive(Debug, Deserialize, Default)]
struct ReportConfigFile {
    service: Option<ServiceConfigFile>,
    notes: Option<NotesConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ServiceConfigFile {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct NotesConfigFile {
    confidence_threshold: Option<f64>,
    min_visibility_secs: Option<f64>,
    fragmentation_threshold: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RenderConfigFile {
    timeline_columns: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub service: ServiceSettings,
    pub notes: ReportSettings,
    pub timeline_columns: usize,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Base URL of the detection service, without trailing slash.
    pub url: String,
    /// Upload plus inference budget; long videos take minutes.
    pub timeout: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings {
                url: DEFAULT_SERVICE_URL.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            notes: ReportSettings::default(),
            timeline_columns: DEFAULT_TIMELINE_COLUMNS,
        }
    }
}

impl ReportConfig {
    /// File named by `PPE_REPORT_CONFIG`, then `PPE_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PPE_REPORT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ReportConfigFile) -> Self {
        let defaults = Self::default();
        let service = file.service.unwrap_or_default();
        let notes = file.notes.unwrap_or_default();
        Self {
            service: ServiceSettings {
                url: service.url.unwrap_or(defaults.service.url),
                timeout: service
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.service.timeout),
            },
            notes: ReportSettings {
                confidence_threshold: notes
                    .confidence_threshold
                    .unwrap_or(defaults.notes.confidence_threshold),
                min_visibility_s: notes
                    .min_visibility_secs
                    .unwrap_or(defaults.notes.min_visibility_s),
                fragmentation_threshold: notes
                    .fragmentation_threshold
                    .unwrap_or(defaults.notes.fragmentation_threshold),
            },
            timeline_columns: file
                .render
                .and_then(|render| render.timeline_columns)
                .unwrap_or(defaults.timeline_columns),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PPE_SERVICE_URL") {
            if !url.trim().is_empty() {
                self.service.url = url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var("PPE_SERVICE_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("PPE_SERVICE_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.service.timeout = Duration::from_secs(seconds);
        }
        if let Ok(threshold) = std::env::var("PPE_CONFIDENCE_THRESHOLD") {
            self.notes.confidence_threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_CONFIDENCE_THRESHOLD must be a number in 0..=1"))?;
        }
        if let Ok(seconds) = std::env::var("PPE_MIN_VISIBILITY_SECS") {
            self.notes.min_visibility_s = seconds
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_MIN_VISIBILITY_SECS must be a number of seconds"))?;
        }
        if let Ok(columns) = std::env::var("PPE_TIMELINE_COLUMNS") {
            self.timeline_columns = columns
                .trim()
                .parse()
                .map_err(|_| anyhow!("PPE_TIMELINE_COLUMNS must be a positive integer"))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.service.url = normalize_service_url(&self.service.url)?;
        if self.service.timeout.is_zero() {
            return Err(anyhow!("service timeout must be greater than zero"));
        }
        let threshold = self.notes.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "confidence threshold must be within 0..=1 (got {})",
                threshold
            ));
        }
        let visibility = self.notes.min_visibility_s;
        if !visibility.is_finite() || visibility < 0.0 {
            return Err(anyhow!(
                "minimum visibility must be a non-negative number of seconds (got {})",
                visibility
            ));
        }
        if self.timeline_columns < MIN_TIMELINE_COLUMNS {
            return Err(anyhow!(
                "timeline columns must be at least {} (got {})",
                MIN_TIMELINE_COLUMNS,
                self.timeline_columns
            ));
        }
        Ok(())
    }
}

/// Validate a detection service base URL and strip any trailing slash.
pub fn normalize_service_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim()).map_err(|e| anyhow!("invalid service url {}: {}", raw, e))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(
            "service url must use http or https (got {})",
            url.scheme()
        ));
    }
    if url.host_str().is_none() {
        return Err(anyhow!("service url {} has no host", raw));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn read_config_file(path: &Path) -> Result<ReportConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
