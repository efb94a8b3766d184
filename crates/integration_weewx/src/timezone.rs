//! Station timezone lookup
//!
//! The feed publishes the station's coordinates but not its zone, so the
//! observation time is localised through a [`TimezoneResolver`].

use chrono_tz::Tz;
#[cfg(test)]
use mockall::automock;
use tzf_rs::DefaultFinder;

use crate::client::WeewxError;

/// Resolves geographic coordinates to an IANA zone name
#[cfg_attr(test, automock)]
pub trait TimezoneResolver: Send + Sync {
    /// Zone name for the given position, or `None` if no zone covers it
    fn resolve(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Offline polygon lookup backed by the bundled timezone boundaries
pub struct GeoTimezoneResolver {
    finder: DefaultFinder,
}

impl std::fmt::Debug for GeoTimezoneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTimezoneResolver").finish_non_exhaustive()
    }
}

impl GeoTimezoneResolver {
    /// Load the boundary data. This is comparatively slow, so build one
    /// resolver and share it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            finder: DefaultFinder::new(),
        }
    }
}

impl Default for GeoTimezoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TimezoneResolver for GeoTimezoneResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Option<String> {
        let name = self.finder.get_tz_name(longitude, latitude);
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// Always answers the same zone, for stations whose zone is known up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedTimezone(pub String);

impl FixedTimezone {
    /// Create a resolver for the given zone name
    pub fn new(zone: impl Into<String>) -> Self {
        Self(zone.into())
    }
}

impl TimezoneResolver for FixedTimezone {
    fn resolve(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Parse an IANA zone name
///
/// # Errors
///
/// Returns [`WeewxError::UnknownTimezone`] if the name is not in the tz database.
pub fn parse_zone(name: &str) -> Result<Tz, WeewxError> {
    name.parse::<Tz>()
        .map_err(|_| WeewxError::UnknownTimezone(name.to_string()))
}
