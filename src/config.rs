use crate::error::BatchError;

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_OUTPUT_DIR: &str = "processed";
pub const DEFAULT_LOG_FILE: &str = "errorFile.txt";

/// Settings for one batch run, optionally read from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Collapse time series stacks by maximum intensity over depth.
    pub project_time_series: bool,
    /// Where results go. `None` means `<root>/processed`.
    pub output_dir: Option<PathBuf>,
    /// Name of the run log, created in the root directory.
    pub log_file: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            project_time_series: true,
            output_dir: None,
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, BatchError> {
        let text = fs::read_to_string(path).map_err(|e| BatchError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| BatchError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn output_dir_for(&self, root: &Path) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| root.join(DEFAULT_OUTPUT_DIR))
    }

    pub fn log_path_for(&self, root: &Path) -> PathBuf {
        root.join(&self.log_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_original_layout() {
        let config = BatchConfig::default();
        let root = Path::new("/data/exp");
        assert!(config.project_time_series);
        assert_eq!(config.output_dir_for(root), root.join("processed"));
        assert_eq!(config.log_path_for(root), root.join("errorFile.txt"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anilyze.toml");
        fs::write(&path, "project_time_series = false\n").unwrap();

        let config = BatchConfig::from_file(&path).unwrap();
        assert!(!config.project_time_series);
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anilyze.toml");
        fs::write(&path, "project_time_series = \"maybe\"\n").unwrap();

        let err = BatchConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BatchError::Config { .. }));
    }
}
