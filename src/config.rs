//! TOML configuration for the harness.
//!
//! Layered: compiled-in defaults, then an optional config file, then CLI
//! overrides applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLASHCHECK_CONFIG";

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG: &str = "clashcheck.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for one harness run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarnessConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded harness configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `CLASHCHECK_CONFIG` environment variable.
    /// 2. `./clashcheck.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "CLASHCHECK_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// The dashboard under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL, without a trailing `/api`.
    pub base_url: String,
    /// Clan tag used for the roster and insights calls, without `#`.
    pub clan_tag: String,
    /// Static User-Agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout. Unset means the HTTP client's default.
    pub timeout_secs: Option<u64>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5050".to_string(),
            clan_tag: "2PR8R8V8P".to_string(),
            user_agent: "Clash-Intelligence-Test/1.0".to_string(),
            timeout_secs: None,
        }
    }
}

impl TargetConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Where the structured JSON report is written.
    pub path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("test_results_detailed.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON log lines instead of the human format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_point_at_local_dashboard() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.target.base_url, "http://localhost:5050");
        assert_eq!(cfg.target.clan_tag, "2PR8R8V8P");
        assert!(cfg.target.timeout().is_none());
        assert_eq!(cfg.report.path, PathBuf::from("test_results_detailed.json"));
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[target]\nbase_url = \"http://dash.internal:8080\"\ntimeout_secs = 15\n"
        )
        .unwrap();

        let cfg = HarnessConfig::load(file.path()).unwrap();
        assert_eq!(cfg.target.base_url, "http://dash.internal:8080");
        assert_eq!(cfg.target.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.target.clan_tag, "2PR8R8V8P");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[target\nbase_url = 3").unwrap();

        let err = HarnessConfig::load(file.path()).unwrap_err();
        assert!(format!("{err}").contains("failed to parse config file"));
    }
}
