use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

pub const DEFAULT_SKIP_COUNT: u32 = 7;
pub const DEFAULT_DOCUMENT_THRESHOLD: f64 = 0.7;
pub const DEFAULT_PARAGRAPH_THRESHOLD: f64 = 0.7;
pub const DEFAULT_PAGE_DISPLAY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_MATCH_DISPLAY_THRESHOLD: f64 = 0.72;

/// Knobs of the comparison engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Leading pages of every document left out of the comparison.
    pub skip_count: u32,
    /// A document is reported only if one of its matches reaches this score.
    pub document_threshold: f64,
    /// A paragraph pair is recorded only if its score is above this.
    pub paragraph_threshold: f64,
    /// Worker threads per scan. `None` uses every available core.
    pub parallelism: Option<usize>,
    /// Upper bound, in milliseconds, for comparing one main page against one
    /// candidate document. A candidate that runs over is left out of the scan.
    pub task_timeout_ms: Option<u64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            skip_count: DEFAULT_SKIP_COUNT,
            document_threshold: DEFAULT_DOCUMENT_THRESHOLD,
            paragraph_threshold: DEFAULT_PARAGRAPH_THRESHOLD,
            parallelism: None,
            task_timeout_ms: None,
        }
    }
}

impl ScanConfig {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn worker_threads(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn validate(&self) -> Result<()> {
        check_threshold("document_threshold", self.document_threshold)?;
        check_threshold("paragraph_threshold", self.paragraph_threshold)?;
        if self.parallelism == Some(0) {
            return Err(ScanError::Config("parallelism must be at least 1".into()));
        }
        if self.task_timeout_ms == Some(0) {
            return Err(ScanError::Config("task timeout must be at least 1 ms".into()));
        }
        Ok(())
    }
}

/// Thresholds used only when rendering a report for people to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// A page pair is shown if one of its matches reaches this score.
    pub page_display_threshold: f64,
    /// Within a shown page pair, matches below this score are hidden.
    pub match_display_threshold: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            page_display_threshold: DEFAULT_PAGE_DISPLAY_THRESHOLD,
            match_display_threshold: DEFAULT_MATCH_DISPLAY_THRESHOLD,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        check_threshold("page_display_threshold", self.page_display_threshold)?;
        check_threshold("match_display_threshold", self.match_display_threshold)
    }
}

/// Everything needed to run a scan from the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub main_document: Option<PathBuf>,
    pub corpus_dir: Option<PathBuf>,
    pub scan: ScanConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_path(path.as_ref());
        let raw = fs::read_to_string(&path).map_err(|e| {
            ScanError::Config(format!("cannot read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| ScanError::Config(format!("bad config {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        self.display.validate()
    }
}

/// Expands a leading `~` and environment variables in a user supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

fn check_threshold(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScanError::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.skip_count, 7);
        assert_eq!(cfg.document_threshold, 0.7);
        assert_eq!(cfg.paragraph_threshold, 0.7);
        assert!(cfg.validate().is_ok());
        assert!(DisplayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let bad_threshold = ScanConfig {
            paragraph_threshold: 1.5,
            ..ScanConfig::default()
        };
        assert!(matches!(bad_threshold.validate(), Err(ScanError::Config(_))));

        let no_workers = ScanConfig {
            parallelism: Some(0),
            ..ScanConfig::default()
        };
        assert!(matches!(no_workers.validate(), Err(ScanError::Config(_))));

        let no_time = ScanConfig {
            task_timeout_ms: Some(0),
            ..ScanConfig::default()
        };
        assert!(matches!(no_time.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r#"{"scan": {"document_threshold": 0.9}}"#).unwrap();
        assert_eq!(cfg.scan.document_threshold, 0.9);
        assert_eq!(cfg.scan.paragraph_threshold, 0.7);
        assert_eq!(cfg.scan.skip_count, 7);
        assert_eq!(cfg.display, DisplayConfig::default());
        assert!(cfg.main_document.is_none());
    }

    #[test]
    fn test_worker_threads_prefers_explicit_value() {
        let cfg = ScanConfig {
            parallelism: Some(3),
            ..ScanConfig::default()
        };
        assert_eq!(cfg.worker_threads(), 3);
        assert!(ScanConfig::default().worker_threads() >= 1);
    }
}
