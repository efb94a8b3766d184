//! weewx RSS client
//!
//! Fetches a station's RSS feed over HTTP and turns it into a weather report.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::feed::parse_feed;
use crate::models::WeatherResult;
use crate::normalizer::parse_report;
use crate::timezone::{GeoTimezoneResolver, TimezoneResolver};

/// weewx client errors
#[derive(Debug, Error)]
pub enum WeewxError {
    /// Connection to the station's web server failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request for the feed failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Request for the feed timed out
    #[error("Request timed out")]
    Timeout,

    /// Station web server returned a server error
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Feed body is not a readable RSS document
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Feed has fewer items than expected
    #[error("Feed has no item at index {index}")]
    MissingItem {
        /// Zero-based index of the missing item
        index: usize,
    },

    /// Feed item lacks a required element
    #[error("Feed item {item} has no <{element}> element")]
    MissingElement {
        /// Qualified element name
        element: &'static str,
        /// Zero-based item index
        item: usize,
    },

    /// Station coordinates out of range
    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    /// No timezone covers the station coordinates
    #[error("No timezone found for {latitude}, {longitude}")]
    TimezoneNotFound {
        /// Station latitude
        latitude: f64,
        /// Station longitude
        longitude: f64,
    },

    /// Resolved zone name is not in the tz database
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// weewx feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeewxConfig {
    /// URL of the station's RSS feed (e.g. <http://station.local/weewx/RSS/weewx_rss.xml>)
    pub feed_url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with the request
    #[serde(default)]
    pub user_agent: Option<String>,
}

const fn default_timeout() -> u64 {
    30
}

impl WeewxConfig {
    /// Configuration for the given feed URL with default settings
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            timeout_secs: default_timeout(),
            user_agent: None,
        }
    }
}

/// Weather client trait for fetching station reports
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Fetch the feed once and build the current report
    async fn update(&self) -> Result<WeatherResult, WeewxError>;

    /// Check if the feed is reachable and readable
    async fn is_healthy(&self) -> bool;
}

/// HTTP client for a weewx RSS feed
pub struct WeewxClient {
    client: Client,
    config: WeewxConfig,
    resolver: Arc<dyn TimezoneResolver>,
}

impl std::fmt::Debug for WeewxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeewxClient")
            .field("config", &self.config)
            .field("resolver", &"dyn TimezoneResolver")
            .finish_non_exhaustive()
    }
}

impl WeewxClient {
    /// Create a client that looks up the station's zone from its coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: WeewxConfig) -> Result<Self, WeewxError> {
        Self::with_resolver(config, Arc::new(GeoTimezoneResolver::new()))
    }

    /// Create a client with a custom timezone resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_resolver(
        config: WeewxConfig,
        resolver: Arc<dyn TimezoneResolver>,
    ) -> Result<Self, WeewxError> {
        let mut builder =
            Client::builder().timeout(std::time::Duration::from_secs(config.timeout_secs));
        if let Some(ref agent) = config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| WeewxError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            resolver,
        })
    }

    /// Configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &WeewxConfig {
        &self.config
    }

    /// Build the weather result from an RSS document already in hand
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not RSS or lacks the items and
    /// elements a weewx feed carries.
    pub fn parse_body(&self, body: &str) -> Result<WeatherResult, WeewxError> {
        let items = parse_feed(body).inspect_err(|e| {
            error!(error = %e, "Error parsing weather feed");
        })?;
        parse_report(&items, self.resolver.as_ref())
    }

    /// Download the raw feed body
    async fn fetch(&self) -> Result<String, WeewxError> {
        let response = self
            .client
            .get(&self.config.feed_url)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Error retrieving weather report");
                if e.is_timeout() {
                    WeewxError::Timeout
                } else if e.is_connect() {
                    WeewxError::ConnectionFailed(e.to_string())
                } else {
                    WeewxError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_server_error() {
            error!(%status, "Error retrieving weather report");
            return Err(WeewxError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            error!(%status, "Error retrieving weather report");
            return Err(WeewxError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| WeewxError::RequestFailed(e.to_string()))
    }
}

#[async_trait]
impl WeatherClient for WeewxClient {
    #[instrument(skip(self))]
    async fn update(&self) -> Result<WeatherResult, WeewxError> {
        debug!(url = %self.config.feed_url, "Updating weather with weewx");

        let body = self.fetch().await?;
        debug!(bytes = body.len(), "Fetched weather feed");

        self.parse_body(&body)
    }

    async fn is_healthy(&self) -> bool {
        match self.fetch().await {
            Ok(body) => parse_feed(&body).is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::FixedTimezone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:geo="http://www.w3.org/2003/01/geo/wgs84_pos#">
  <channel>
    <item>
      <geo:lat>47.3769</geo:lat>
      <geo:long>8.5417</geo:long>
      <content:encoded><![CDATA[Time: 18.10.2026 07:05:00<br />
Outside Temperature: 4,2&#176;C<br />
Humidity: 93%<br />
Barometer: 1021,5 mbar<br />
Wind: 0,0 kph from 0&#176;<br />]]></content:encoded>
    </item>
    <item>
      <content:encoded><![CDATA[Max Wind: 18,0 kph<br />
Rain today: 0,00 cm<br />]]></content:encoded>
    </item>
  </channel>
</rss>"#;

    fn zurich_client() -> WeewxClient {
        WeewxClient::with_resolver(
            WeewxConfig::new("http://localhost/weewx_rss.xml"),
            Arc::new(FixedTimezone::new("Europe/Zurich")),
        )
        .expect("client creation should succeed")
    }

    #[test]
    fn test_config_defaults() {
        let config = WeewxConfig::new("http://station.local/rss.xml");
        assert_eq!(config.feed_url, "http://station.local/rss.xml");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_config_deserialization_applies_defaults() {
        let config: WeewxConfig =
            serde_json::from_str(r#"{"feed_url": "http://station.local/rss.xml"}"#)
                .expect("should deserialize");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = WeewxConfig {
            feed_url: "https://weather.example.com/rss.xml".to_string(),
            timeout_secs: 5,
            user_agent: Some("station-monitor/1.0".to_string()),
        };

        let json = serde_json::to_string(&config).expect("should serialize");
        let deserialized: WeewxConfig = serde_json::from_str(&json).expect("should deserialize");

        assert_eq!(deserialized.feed_url, "https://weather.example.com/rss.xml");
        assert_eq!(deserialized.timeout_secs, 5);
        assert_eq!(deserialized.user_agent.as_deref(), Some("station-monitor/1.0"));
    }

    #[test]
    fn test_client_creation() {
        let client = zurich_client();
        assert_eq!(client.config().feed_url, "http://localhost/weewx_rss.xml");
        assert!(format!("{client:?}").contains("WeewxClient"));
    }

    #[test]
    fn test_parse_body() {
        let result = zurich_client().parse_body(FEED).expect("should parse");

        let report = result.report;
        assert_eq!(report.observation_time, "07:05:00");
        assert!((report.temperature - 4.2).abs() < 1e-9);
        assert!((report.humidity - 93.0).abs() < 1e-9);
        assert_eq!(report.air_pressure, Some(1022));
        assert!(report.wind_speed.abs() < 1e-9);
        assert_eq!(report.wind_direction, Some(crate::CompassPoint::N));
        assert!((report.wind_speed_max - 5.0).abs() < 1e-9);
        assert!(report.rain_day.abs() < 1e-9);
        assert!(report.dew_point.is_nan());
        assert!(report.rain_1h.is_nan());
        assert!(result.forecasts.is_empty());
    }

    #[test]
    fn test_unreachable_feed_is_unhealthy() {
        let client = WeewxClient::with_resolver(
            WeewxConfig {
                feed_url: "http://127.0.0.1:1/weewx_rss.xml".to_string(),
                timeout_secs: 2,
                user_agent: None,
            },
            Arc::new(FixedTimezone::new("UTC")),
        )
        .expect("client creation should succeed");

        assert!(!tokio_test::block_on(client.is_healthy()));
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = zurich_client().parse_body("<<<not xml").unwrap_err();
        assert!(matches!(err, WeewxError::XmlParse(_)));
    }

    #[test]
    fn test_weather_error_display() {
        let err = WeewxError::InvalidCoordinates;
        assert!(err.to_string().contains("latitude"));

        let err = WeewxError::MissingItem { index: 1 };
        assert_eq!(err.to_string(), "Feed has no item at index 1");

        let err = WeewxError::MissingElement {
            element: "geo:long",
            item: 0,
        };
        assert_eq!(err.to_string(), "Feed item 0 has no <geo:long> element");

        let err = WeewxError::Timeout;
        assert!(err.to_string().contains("timed out"));
    }
}
