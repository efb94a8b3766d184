//! Report normalization
//!
//! Turns the parsed current-conditions and daily-summary blocks into a
//! [`WeatherReport`] with SI units and a station-local observation time.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

use crate::block::{FieldMap, parse_leading_float, parse_leading_int, parse_text_block};
use crate::client::WeewxError;
use crate::compass::CompassPoint;
use crate::feed::FeedItem;
use crate::models::{WeatherReport, WeatherResult};
use crate::timezone::{TimezoneResolver, parse_zone};

/// Format of the `Time` field in the current-conditions block
const FEED_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Fallback when the station omits seconds
const FEED_MINUTE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Fallback when only the date is readable
const FEED_DATE_FORMAT: &str = "%d.%m.%Y";

/// Format of [`WeatherReport::observation_time`]
const REPORT_TIME_FORMAT: &str = "%H:%M:%S";

/// Placeholder observation time when the feed's `Time` is unreadable
pub const INVALID_TIME: &str = "Invalid date";

/// km/h per m/s
const KPH_PER_MPS: f64 = 3.6;

/// The feed reports rain in cm
const MM_PER_CM: f64 = 10.0;

/// Separator between speed and bearing in the `Wind` field
const WIND_SEPARATOR: &str = " kph from ";

/// Index of the current-conditions item in the channel
const CONDITIONS_ITEM: usize = 0;

/// Index of the daily-summary item in the channel
const DAILY_ITEM: usize = 1;

/// Read a numeric field, NaN when absent or unreadable
fn reading(fields: &FieldMap, key: &str) -> f64 {
    fields
        .get(key)
        .map_or(f64::NAN, |value| parse_leading_float(value))
}

/// Parse the feed's `DD.MM.YYYY HH:MM:SS` time, ignoring trailing text
///
/// Missing seconds read as `:00`, a missing or unreadable time of day as
/// midnight. `None` only when the date itself cannot be read.
fn parse_feed_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_and_remainder(raw, FEED_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_and_remainder(raw, FEED_MINUTE_FORMAT))
        .map(|(naive, _)| naive)
        .or_else(|_| {
            NaiveDate::parse_and_remainder(raw, FEED_DATE_FORMAT)
                .map(|(date, _)| date.and_time(NaiveTime::MIN))
        })
        .ok()
}

/// Localise the feed's time in `tz` and format it as `HH:MM:SS`
///
/// Missing input or an unreadable date yields [`INVALID_TIME`]. A wall-clock
/// time falling into a DST gap is moved forward by an hour.
#[must_use]
pub fn format_observation_time(raw: Option<&str>, tz: Tz) -> String {
    let Some(naive) = raw.and_then(parse_feed_time) else {
        return INVALID_TIME.to_string();
    };

    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map_or_else(
            || INVALID_TIME.to_string(),
            |local| local.format(REPORT_TIME_FORMAT).to_string(),
        )
}

/// Split the `Wind` field (`"<speed> kph from <degrees>"`) into speed in m/s
/// and compass sector
fn parse_wind(wind: Option<&str>) -> (f64, Option<CompassPoint>) {
    let Some(wind) = wind else {
        return (f64::NAN, None);
    };

    let (speed, bearing) = match wind.split_once(WIND_SEPARATOR) {
        Some((speed, bearing)) => (speed, Some(bearing)),
        None => (wind, None),
    };

    let direction = bearing
        .and_then(parse_leading_int)
        .map(CompassPoint::from_degrees);

    (parse_leading_float(speed) / KPH_PER_MPS, direction)
}

/// Build a report from the current-conditions and daily-summary fields
///
/// Never fails: absent fields show up as NaN, `None` or [`INVALID_TIME`].
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_report(conditions: &FieldMap, daily: &FieldMap, tz: Tz) -> WeatherReport {
    let pressure = reading(conditions, "Barometer").round();
    let (wind_speed, wind_direction) = parse_wind(conditions.get("Wind").map(String::as_str));

    WeatherReport {
        observation_time: format_observation_time(conditions.get("Time").map(String::as_str), tz),
        temperature: reading(conditions, "OutsideTemperature"),
        dew_point: reading(conditions, "Dewpoint"),
        humidity: reading(conditions, "Humidity"),
        air_pressure: pressure.is_finite().then_some(pressure as i64),
        rain_1h: reading(conditions, "RainRate") * MM_PER_CM,
        rain_day: reading(daily, "Raintoday") * MM_PER_CM,
        wind_speed,
        wind_direction,
        wind_speed_max: reading(daily, "MaxWind") / KPH_PER_MPS,
    }
}

/// Reject coordinates outside the valid latitude/longitude ranges
fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeewxError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(WeewxError::InvalidCoordinates);
    }
    Ok(())
}

/// Build the weather result from the channel items of a weewx feed
///
/// Item 0 carries the current conditions and the station coordinates,
/// item 1 the daily summary. The station's zone comes from `resolver`.
///
/// # Errors
///
/// Returns a structural error if either item, its `content:encoded` or the
/// coordinates of item 0 are missing, or if no known zone covers the station.
pub fn parse_report(
    items: &[FeedItem],
    resolver: &dyn TimezoneResolver,
) -> Result<WeatherResult, WeewxError> {
    let conditions_item = items.get(CONDITIONS_ITEM).ok_or(WeewxError::MissingItem {
        index: CONDITIONS_ITEM,
    })?;
    let daily_item = items
        .get(DAILY_ITEM)
        .ok_or(WeewxError::MissingItem { index: DAILY_ITEM })?;

    let conditions = parse_text_block(conditions_item.content(CONDITIONS_ITEM)?);
    let daily = parse_text_block(daily_item.content(DAILY_ITEM)?);

    let (latitude, longitude) = conditions_item.coordinates(CONDITIONS_ITEM)?;
    validate_coordinates(latitude, longitude)?;

    let zone = resolver
        .resolve(latitude, longitude)
        .ok_or(WeewxError::TimezoneNotFound {
            latitude,
            longitude,
        })?;
    debug!(timezone = %zone, "Using timezone");
    let tz = parse_zone(&zone)?;

    Ok(WeatherResult::from_report(normalize_report(
        &conditions,
        &daily,
        tz,
    )))
}
