use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "nidmd.json";
pub const ROOT_ENV: &str = "NIDMD_HOME";

/// Settings read at startup. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: f32,
    pub window_height: f32,
    /// Seconds between reads of the log file.
    pub log_poll_secs: f64,
    /// Milliseconds between progress bar refreshes while computing.
    pub progress_poll_ms: u64,
    pub sampling_time: f64,
    pub mode_count: usize,
    pub approx_degree: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            window_width: 1400.0,
            window_height: 900.0,
            log_poll_secs: 3.0,
            progress_poll_ms: 500,
            sampling_time: 0.72,
            mode_count: 5,
            approx_degree: 5,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read `<root>/nidmd.json`, falling back to defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn log_poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.log_poll_secs.max(0.1))
    }

    pub fn progress_poll_interval(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms.max(16))
    }
}

/// Directories the application writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub root: PathBuf,
    pub work: PathBuf,
    pub cache: PathBuf,
    pub log_file: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let cache = root.join("cache");
        Paths {
            work: root.join("work"),
            log_file: cache.join("log.log"),
            cache,
            root,
        }
    }

    /// `$NIDMD_HOME`, or `.nidmd` in the current directory.
    pub fn from_env() -> Self {
        let root = std::env::var_os(ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".nidmd"));
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_poll_interval(), Duration::from_secs(3));
        assert_eq!(config.sampling_time, 0.72);
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "mode_count": 8, "approx_degree": 20 }"#,
        )
        .unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.mode_count, 8);
        assert_eq!(config.approx_degree, 20);
        assert_eq!(config.progress_poll_ms, 500);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let err = AppConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("nidmd.json"));
    }

    #[test]
    fn json_round_trip_keeps_values() {
        let config = AppConfig {
            mode_count: 3,
            ..Default::default()
        };
        let back = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn paths_layout() {
        let paths = Paths::new("/tmp/nidmd");
        assert_eq!(paths.work, PathBuf::from("/tmp/nidmd/work"));
        assert_eq!(paths.log_file, PathBuf::from("/tmp/nidmd/cache/log.log"));
    }
}
