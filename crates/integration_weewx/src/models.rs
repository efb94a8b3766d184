//! Weather report models
//!
//! Types for the normalized report produced from a weewx feed.

use serde::{Deserialize, Deserializer, Serialize};

use crate::compass::CompassPoint;

/// Attribution shown alongside data from this provider
pub const ATTRIBUTION: &str = "Powered by weewx";

/// Report fields this provider fills, in display order
pub const REPORT_CHARACTERISTICS: [&str; 10] = [
    "ObservationTime",
    "Temperature",
    "DewPoint",
    "Humidity",
    "AirPressure",
    "Rain1h",
    "RainDay",
    "WindSpeed",
    "WindDirection",
    "WindSpeedMax",
];

/// Forecast fields this provider fills (none, the feed carries no forecast)
pub const FORECAST_CHARACTERISTICS: [&str; 0] = [];

/// Number of forecast days this provider can deliver
pub const FORECAST_DAYS: u8 = 0;

/// Read a reading back from JSON, where NaN was written as `null`
fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Current conditions at the station
///
/// Numeric readings that are missing or unreadable in the feed are NaN
/// rather than an error; the whole report is always produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WeatherReport {
    /// Local observation time as `HH:MM:SS`, or `"Invalid date"`
    pub observation_time: String,
    /// Outside temperature in °C
    #[serde(deserialize_with = "nan_from_null")]
    pub temperature: f64,
    /// Dew point in °C
    #[serde(deserialize_with = "nan_from_null")]
    pub dew_point: f64,
    /// Relative humidity in percent
    #[serde(deserialize_with = "nan_from_null")]
    pub humidity: f64,
    /// Barometric pressure in hPa, rounded; `None` when unreadable
    pub air_pressure: Option<i64>,
    /// Current rain rate in mm/h
    #[serde(rename = "Rain1h", deserialize_with = "nan_from_null")]
    pub rain_1h: f64,
    /// Rain since midnight in mm
    #[serde(deserialize_with = "nan_from_null")]
    pub rain_day: f64,
    /// Wind speed in m/s
    #[serde(deserialize_with = "nan_from_null")]
    pub wind_speed: f64,
    /// Wind direction; `None` when the feed gives no bearing
    pub wind_direction: Option<CompassPoint>,
    /// Today's maximum wind speed in m/s
    #[serde(deserialize_with = "nan_from_null")]
    pub wind_speed_max: f64,
}

impl WeatherReport {
    /// Get a formatted one-line summary of the report
    #[must_use]
    pub fn summary(&self) -> String {
        let pressure = self
            .air_pressure
            .map_or_else(|| "n/a".to_string(), |p| format!("{p} hPa"));
        let direction = self.wind_direction.map_or("n/a", |d| d.label());

        format!(
            "{} {:.1}°C (dew point {:.1}°C), humidity {:.0}%, pressure {}, \
             wind {:.1} m/s {} (max {:.1} m/s), rain {:.1} mm/h, {:.1} mm today",
            self.observation_time,
            self.temperature,
            self.dew_point,
            self.humidity,
            pressure,
            self.wind_speed,
            direction,
            self.wind_speed_max,
            self.rain_1h,
            self.rain_day
        )
    }
}

/// Result of one update: the current report and (always empty) forecasts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherResult {
    /// Current conditions
    pub report: WeatherReport,
    /// Forecast entries; the weewx feed never provides any
    pub forecasts: Vec<WeatherReport>,
}

impl WeatherResult {
    /// Wrap a report with an empty forecast list
    #[must_use]
    pub fn from_report(report: WeatherReport) -> Self {
        Self {
            report,
            forecasts: Vec::new(),
        }
    }
}
