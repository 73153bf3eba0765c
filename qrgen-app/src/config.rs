//! Runtime configuration for the application host.

use std::path::PathBuf;

use qrgen_core::storage::DEFAULT_CAPACITY;

use crate::cli::CliArgs;

/// Directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "qrgen";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding `storage.json`.
    pub data_dir: PathBuf,
    /// Initial value of the "prefers dark" environment signal.
    pub prefers_dark: bool,
    /// Storage capacity in bytes.
    pub storage_quota: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    /// Platform data directory, light environment, 5 MiB quota.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_dir: default_data_dir(),
            prefers_dark: false,
            storage_quota: DEFAULT_CAPACITY,
        }
    }
}

impl From<&CliArgs> for AppConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            data_dir: args.data_dir.clone().unwrap_or_else(default_data_dir),
            prefers_dark: args.prefers_dark,
            storage_quota: args.storage_quota,
        }
    }
}

/// `<platform data dir>/qrgen`, or `./.qrgen` when the platform has none.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!(".{APP_DIR_NAME}")),
        |dir| dir.join(APP_DIR_NAME),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert!(config.data_dir.ends_with(APP_DIR_NAME) || config.data_dir.ends_with(".qrgen"));
        assert!(!config.prefers_dark);
        assert_eq!(config.storage_quota, 5 * 1024 * 1024);
    }

    #[test]
    fn test_from_cli_args() {
        let args = CliArgs::try_parse_from([
            "qrgen",
            "--data-dir",
            "/tmp/qrgen-test",
            "--prefers-dark",
            "--storage-quota",
            "2048",
            "panel",
            "toggle",
        ])
        .expect("parse");

        let config = AppConfig::from(&args);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/qrgen-test"));
        assert!(config.prefers_dark);
        assert_eq!(config.storage_quota, 2048);
    }
}
