use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://watch.dropout.tv";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; dropout-catalog/slow-mode)";
const DEFAULT_OUTPUT_TEMPLATE: &str =
    "%(series)s/Season %(season_number)02d/%(episode_number)02d - %(episode)s.%(ext)s";

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub base_url: String,
    pub user_agent: String,
    /// Status the series index answers with once the page number runs past the end.
    pub boundary_status: u16,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    /// 0 retries forever.
    pub max_attempts: u32,
    pub backoff_factor: u32,
    pub cookies_file: PathBuf,
    pub archive_file: PathBuf,
    pub urls_file: PathBuf,
    pub sub_langs: String,
    pub output_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            boundary_status: 400,
            request_delay_ms: 2500,
            timeout_secs: 60,
            max_attempts: 10,
            backoff_factor: 2,
            cookies_file: PathBuf::from("config").join("cookies.txt"),
            archive_file: PathBuf::from("config").join("archive.txt"),
            urls_file: PathBuf::from("urls.txt"),
            sub_langs: "en.*".to_string(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    /// Loads `explicit` if given, else the user config file when present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = get_config_path();
                if !path.exists() {
                    tracing::debug!("no config file at {}, using defaults", path.display());
                    return Ok(Config::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join("dropout-dl"))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}

fn get_config_path() -> PathBuf {
    get_config_dir_path().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.base_url, "https://watch.dropout.tv");
        assert_eq!(config.boundary_status, 400);
        assert_eq!(config.request_delay(), Duration::from_millis(2500));
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.urls_file, PathBuf::from("urls.txt"));
        assert_eq!(config.cookies_file, PathBuf::from("config/cookies.txt"));
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = Config::parse(
            r#"
            base_url = "http://localhost:8080"
            request_delay_ms = 0
            max_attempts = 0
            sub_langs = "en,fr"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.request_delay(), Duration::ZERO);
        assert_eq!(config.max_attempts, 0);
        assert_eq!(config.sub_langs, "en,fr");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("retries = 3").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "urls_file = \"episodes.txt\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.urls_file, PathBuf::from("episodes.txt"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
