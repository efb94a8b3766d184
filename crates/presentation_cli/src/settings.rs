//! CLI settings
//!
//! Layered configuration: built-in defaults, then an optional TOML file,
//! then `WEEWX_*` environment variables, then command-line flags.

use std::path::Path;

use integration_weewx::WeewxConfig;
use serde::Deserialize;

/// Environment variable prefix (e.g. `WEEWX_FEED_URL`)
pub const ENV_PREFIX: &str = "WEEWX";

/// Settings as read from file and environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Station RSS feed URL
    #[serde(default)]
    pub feed_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header for feed requests
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Fixed IANA zone for the station, skipping the coordinate lookup
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("No feed URL configured (set feed_url, WEEWX_FEED_URL or --url)")]
    MissingFeedUrl,
}

impl Settings {
    /// Load settings from `path` (if it exists) and the environment
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let builder = config::Config::builder()
            .set_default("timeout_secs", 30)?
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Client configuration, with `url_override` taking precedence over the
    /// configured feed URL
    pub fn weewx_config(&self, url_override: Option<&str>) -> Result<WeewxConfig, SettingsError> {
        let feed_url = url_override
            .or(self.feed_url.as_deref())
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingFeedUrl)?;

        Ok(WeewxConfig {
            feed_url: feed_url.to_string(),
            timeout_secs: self.timeout_secs,
            user_agent: self.user_agent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn load_from_file() {
        let file = write_config(
            r#"
feed_url = "http://station.local/weewx/RSS/weewx_rss.xml"
timeout_secs = 10
timezone = "Europe/Berlin"
"#,
        );

        let settings = Settings::load(file.path()).expect("should load");
        assert_eq!(
            settings.feed_url.as_deref(),
            Some("http://station.local/weewx/RSS/weewx_rss.xml")
        );
        assert_eq!(settings.timeout_secs, 10);
        assert_eq!(settings.timezone.as_deref(), Some("Europe/Berlin"));
        assert!(settings.user_agent.is_none());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let settings =
            Settings::load(Path::new("/nonexistent/weewx-cli-test.toml")).expect("should load");
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("feed_url = [unterminated");
        assert!(matches!(
            Settings::load(file.path()),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn weewx_config_prefers_override() {
        let settings = Settings {
            feed_url: Some("http://from-file/rss.xml".to_string()),
            timeout_secs: 15,
            user_agent: Some("station-monitor".to_string()),
            timezone: None,
        };

        let config = settings
            .weewx_config(Some("http://from-flag/rss.xml"))
            .expect("should build");
        assert_eq!(config.feed_url, "http://from-flag/rss.xml");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.user_agent.as_deref(), Some("station-monitor"));

        let config = settings.weewx_config(None).expect("should build");
        assert_eq!(config.feed_url, "http://from-file/rss.xml");
    }

    #[test]
    fn weewx_config_requires_url() {
        let settings = Settings::default();
        assert!(matches!(
            settings.weewx_config(None),
            Err(SettingsError::MissingFeedUrl)
        ));
        assert!(matches!(
            settings.weewx_config(Some("  ")),
            Err(SettingsError::MissingFeedUrl)
        ));
    }
}
