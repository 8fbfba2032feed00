use std::path::{Path, PathBuf};

use larder_api::DEFAULT_BASE_URL;
use serde::Deserialize;

use crate::store::default_token_path;

const API_URL_ENV: &str = "LARDER_API_URL";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub token_path: Option<PathBuf>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("larder").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Config::default(),
    }
}

fn load_config_from(path: &Path) -> Config {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Config::default();
    };

    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Flag, then `LARDER_API_URL`, then config file, then the built-in origin.
pub fn resolve_api_url(cli_url: Option<String>, config: &Config) -> String {
    let env_url = std::env::var(API_URL_ENV).ok();
    pick_api_url(cli_url, env_url, config)
}

fn pick_api_url(cli_url: Option<String>, env_url: Option<String>, config: &Config) -> String {
    [cli_url, env_url, config.api_url.clone()]
        .into_iter()
        .flatten()
        .find(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

pub fn resolve_token_path(cli_path: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_path
        .or_else(|| config.token_path.clone())
        .unwrap_or_else(default_token_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_precedence() {
        let config = Config {
            api_url: Some("http://from-config".to_string()),
            token_path: None,
        };

        assert_eq!(
            pick_api_url(
                Some("http://from-flag".to_string()),
                Some("http://from-env".to_string()),
                &config
            ),
            "http://from-flag"
        );
        assert_eq!(
            pick_api_url(None, Some("http://from-env".to_string()), &config),
            "http://from-env"
        );
        assert_eq!(
            pick_api_url(None, Some(String::new()), &config),
            "http://from-config"
        );
        assert_eq!(
            pick_api_url(None, None, &Config::default()),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn test_token_path_precedence() {
        let config = Config {
            api_url: None,
            token_path: Some(PathBuf::from("/tmp/from-config")),
        };

        assert_eq!(
            resolve_token_path(Some(PathBuf::from("/tmp/flag")), &config),
            PathBuf::from("/tmp/flag")
        );
        assert_eq!(
            resolve_token_path(None, &config),
            PathBuf::from("/tmp/from-config")
        );
        assert_eq!(
            resolve_token_path(None, &Config::default()),
            default_token_path()
        );
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = \"https://stock.example.com\"\n").unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.api_url.as_deref(), Some("https://stock.example.com"));
        assert_eq!(config.token_path, None);
    }

    #[test]
    fn test_invalid_or_missing_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(load_config_from(&path).api_url.is_none());

        std::fs::write(&path, "api_url = [").unwrap();
        assert!(load_config_from(&path).api_url.is_none());
    }
}
