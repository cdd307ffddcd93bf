//! Configuration for share resolution and download destinations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::ShareLinkParser;

/// Default share host.
pub const DEFAULT_BASE_URL: &str = "https://cloud.tsinghua.edu.cn";

/// Environment variable overriding [`ShareConfig::base_url`].
pub const BASE_URL_ENV: &str = "SHARE_DL_BASE_URL";

/// Settings describing the share service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Host that share links point at, without a trailing slash.
    pub base_url: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Path configuration for download and config directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory preselected as the download destination.
    pub download_dir: Option<PathBuf>,
    /// Directory where configuration files are read from.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            download_dir: None,
            config_dir: config_dir.join("share-dl"),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub share: ShareConfig,
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the share host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.share.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the preselected download directory.
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.download_dir = Some(dir.into());
        self
    }

    /// Builds a share link parser for the configured host.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL yields an invalid pattern.
    pub fn link_parser(&self) -> crate::Result<ShareLinkParser> {
        ShareLinkParser::new(&self.share)
    }

    /// Path of the configuration file inside the config directory.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.paths.config_dir.join("config.toml")
    }

    /// Loads `config.toml` from the default config directory, falling back
    /// to defaults when it does not exist, then applies the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> crate::Result<Self> {
        let path = Self::default().config_file();
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_env())
    }

    /// Loads configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        if let Some(dir) = path.parent() {
            config.paths.config_dir = dir.to_path_buf();
        }
        log::debug!("Loaded configuration from {}", path.display());
        let base_url = config.share.base_url.clone();
        Ok(config.with_base_url(base_url))
    }

    /// Applies `SHARE_DL_BASE_URL` if set.
    #[must_use]
    pub fn with_env(self) -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => self.with_base_url(url.trim()),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_app_config() {
        let config = AppConfig::default();
        assert_eq!(config.share.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.paths.download_dir, None);
        assert!(config.paths.config_dir.to_string_lossy().contains("share-dl"));
    }

    #[test]
    fn builder_pattern() {
        let config = AppConfig::new()
            .with_base_url("https://files.example.org/")
            .with_download_dir("/tmp/out");
        assert_eq!(config.share.base_url, "https://files.example.org");
        assert_eq!(config.paths.download_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn link_parser_follows_configured_host() {
        let config = AppConfig::new().with_base_url("https://seafile.example.com/");
        let parser = config.link_parser().unwrap();
        assert_eq!(
            parser.parse("https://seafile.example.com/d/k9/"),
            Some("k9".to_string())
        );
        assert_eq!(parser.parse("https://cloud.tsinghua.edu.cn/d/k9/"), None);
    }

    #[test]
    fn load_from_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[share]\nbase_url = \"https://seafile.example.com/\"\n\n[paths]\ndownload_dir = \"/data\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.share.base_url, "https://seafile.example.com");
        assert_eq!(config.paths.download_dir, Some(PathBuf::from("/data")));
        assert_eq!(config.paths.config_dir, dir.path());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[paths]\ndownload_dir = \"/data\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.share.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "share = 3").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(crate::Error::Config(_))
        ));
        assert!(matches!(
            AppConfig::load_from(&dir.path().join("missing.toml")),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = AppConfig::new().with_download_dir("/data");
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.share, config.share);
        assert_eq!(deserialized.paths.download_dir, config.paths.download_dir);
    }
}
