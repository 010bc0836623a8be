use anyhow::{Context, Result};
use logcache_engine::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_LOG_FILE: &str = "/var/log/nagios/nagios.log";
const DEFAULT_ARCHIVE_PATH: &str = "/var/log/nagios/archives";

/// Settings given on the command line. Each one overrides the configuration
/// file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub log_file: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    pub max_cached_messages: Option<usize>,
}

pub fn from_yaml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?;

    Ok(config)
}

/// Build the configuration from an optional file and the command line.
pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Config> {
    let mut config = match config_file {
        Some(path) => from_yaml_file(path)?,
        None => Config::new(DEFAULT_LOG_FILE, DEFAULT_ARCHIVE_PATH),
    };

    if let Some(log_file) = overrides.log_file {
        config = config.with_log_file(log_file);
    }
    if let Some(archive_path) = overrides.archive_path {
        config = config.with_archive_path(archive_path);
    }
    if let Some(max) = overrides.max_cached_messages {
        config = config.with_max_cached_messages(max);
    }

    config.validate().context("Invalid configuration")?;

    if !config.log_file().exists() {
        warn!("Log file '{}' does not exist", config.log_file().display());
    }
    if !config.archive_path().is_dir() {
        warn!(
            "Log archive '{}' is not a directory",
            config.archive_path().display()
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_with_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lcq.yaml");
        fs::write(
            &path,
            "log_file: /srv/nagios/nagios.log\n\
             archive_path: /srv/nagios/archives\n\
             max_cached_messages: 1000\n",
        )
        .unwrap();

        let config = load(
            Some(&path),
            Overrides {
                archive_path: Some(PathBuf::from("/tmp/archives")),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.log_file(), Path::new("/srv/nagios/nagios.log"));
        assert_eq!(config.archive_path(), Path::new("/tmp/archives"));
        assert_eq!(config.max_cached_messages, 1000);
        assert_eq!(config.check_mem_cycle, 1000);
    }

    #[test]
    fn test_rejects_bad_files() {
        let dir = TempDir::new().unwrap();

        let unknown = dir.path().join("unknown.yaml");
        fs::write(&unknown, "log_file: a\narchive_path: b\nlogfile: c\n").unwrap();
        assert!(load(Some(&unknown), Overrides::default()).is_err());

        let zero = dir.path().join("zero.yaml");
        fs::write(&zero, "log_file: a\narchive_path: b\nmax_cached_messages: 0\n").unwrap();
        assert!(load(Some(&zero), Overrides::default()).is_err());

        assert!(load(Some(&dir.path().join("missing.yaml")), Overrides::default()).is_err());
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load(None, Overrides::default()).unwrap();
        assert_eq!(config.log_file(), Path::new(DEFAULT_LOG_FILE));
        assert_eq!(config.archive_path(), Path::new(DEFAULT_ARCHIVE_PATH));
    }
}
