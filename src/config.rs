// Runtime configuration. Every field has a default matching the Stony Brook
// deployment, so the server runs without a config file; a JSON file passed
// with `--config` overrides any subset of it.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{InvalidRegion, MapRegion, Position, RouteStyles};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoints: Endpoints,
    pub polling: PollingParams,
    pub initial_region: RegionParams,
    /// Route id to marker color and letter.
    pub route_styles: RouteStyles,
    pub location: LocationParams,
    pub http: HttpParams,
    /// IANA name used when formatting timestamps for humans.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub buses: String,
    pub stops: String,
    pub station_status: String,
    pub station_information: String,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingParams {
    pub bus_interval_ms: u64,
    pub station_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionParams {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationParams {
    pub permission_granted: bool,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpParams {
    pub bind: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            endpoints: Endpoints::default(),
            polling: PollingParams::default(),
            initial_region: RegionParams::default(),
            route_styles: RouteStyles::default(),
            location: LocationParams::default(),
            http: HttpParams::default(),
            timezone: "America/New_York".to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            buses: "https://smarttransit.cewit.stonybrook.edu/user_call/getAllActiveBuses.php"
                .to_string(),
            stops: "https://smarttransit.cewit.stonybrook.edu/user_call/getAllStops.php".to_string(),
            station_status: "https://sbu.publicbikesystem.net/ube/gbfs/v1/en/station_status"
                .to_string(),
            station_information:
                "https://sbu.publicbikesystem.net/ube/gbfs/v1/en/station_information".to_string(),
            search: None,
        }
    }
}

impl Default for PollingParams {
    fn default() -> Self {
        PollingParams {
            bus_interval_ms: 2000,
            station_interval_ms: 15000,
        }
    }
}

impl Default for RegionParams {
    fn default() -> Self {
        RegionParams {
            latitude: 40.912418,
            longitude: -73.123395,
            latitude_delta: 0.018,
            longitude_delta: 0.018,
        }
    }
}

impl Default for LocationParams {
    fn default() -> Self {
        let region = RegionParams::default();
        LocationParams {
            permission_granted: true,
            latitude: region.latitude,
            longitude: region.longitude,
        }
    }
}

impl Default for HttpParams {
    fn default() -> Self {
        HttpParams {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl PollingParams {
    pub fn bus_interval(&self) -> Duration {
        Duration::from_millis(self.bus_interval_ms)
    }

    pub fn station_interval(&self) -> Duration {
        Duration::from_millis(self.station_interval_ms)
    }
}

impl LocationParams {
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

impl AppConfig {
    /// Reads `path` if given, otherwise starts from the defaults, then
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&raw)?
            }
            None => AppConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.initial_region()?;
        self.display_timezone()?;

        if self.polling.bus_interval_ms == 0 || self.polling.station_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling intervals must be greater than zero".to_string(),
            ));
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn initial_region(&self) -> Result<MapRegion, InvalidRegion> {
        let r = self.initial_region;
        MapRegion::new(r.latitude, r.longitude, r.latitude_delta, r.longitude_delta)
    }

    pub fn display_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(self.timezone.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteStyle;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.bus_interval(), Duration::from_millis(2000));
        assert_eq!(config.polling.station_interval(), Duration::from_millis(15000));
        assert!(config.endpoints.search.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "polling": {"bus_interval_ms": 5000},
                "route_styles": {"9": {"color": "red", "label": "R"}},
                "endpoints": {"search": "http://localhost:9000/search"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.polling.bus_interval_ms, 5000);
        assert_eq!(config.polling.station_interval_ms, 15000);
        assert_eq!(config.route_styles.style_for("9"), RouteStyle::new("red", "R"));
        assert_eq!(config.route_styles.style_for("4"), RouteStyle::hidden());
        assert_eq!(config.endpoints.search.as_deref(), Some("http://localhost:9000/search"));
        assert!(config.endpoints.buses.ends_with("getAllActiveBuses.php"));
    }

    #[test]
    fn invalid_region_is_rejected() {
        let config =
            AppConfig::from_json(r#"{"initial_region": {"latitude_delta": 0.0}}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Region(_))));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let config = AppConfig::from_json(r#"{"timezone": "Mars/Olympus"}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Timezone(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config =
            AppConfig::from_json(r#"{"polling": {"station_interval_ms": 0}}"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
