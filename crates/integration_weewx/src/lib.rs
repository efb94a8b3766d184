//! weewx weather station integration
//!
//! Reads the RSS feed a weewx installation publishes and turns its
//! current-conditions and daily-summary blocks into a normalized weather
//! report (SI units, station-local observation time).
//! The feed carries no forecast, so forecasts are always empty.

pub mod block;
pub mod client;
mod compass;
pub mod feed;
mod models;
pub mod normalizer;
pub mod timezone;

pub use block::{FieldMap, parse_text_block};
pub use client::{WeatherClient, WeewxClient, WeewxConfig, WeewxError};
pub use compass::CompassPoint;
pub use feed::{FeedItem, parse_feed};
pub use models::{
    ATTRIBUTION, FORECAST_CHARACTERISTICS, FORECAST_DAYS, REPORT_CHARACTERISTICS, WeatherReport,
    WeatherResult,
};
pub use normalizer::{normalize_report, parse_report};
pub use timezone::{FixedTimezone, GeoTimezoneResolver, TimezoneResolver};
