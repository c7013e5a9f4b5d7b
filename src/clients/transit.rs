use tracing::debug;

use super::HttpFetcher;
use crate::error::Result;
use crate::models::{BusPosition, BusStop};

/// Shuttle feed: live bus positions and the (static) stop list. Both
/// endpoints return flat JSON arrays.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: HttpFetcher,
    buses_url: String,
    stops_url: String,
}

impl TransitClient {
    pub fn new(http: HttpFetcher, buses_url: impl Into<String>, stops_url: impl Into<String>) -> Self {
        TransitClient {
            http,
            buses_url: buses_url.into(),
            stops_url: stops_url.into(),
        }
    }

    pub async fn fetch_active_buses(&self) -> Result<Vec<BusPosition>> {
        let buses: Vec<BusPosition> = self.http.get_json(&self.buses_url).await?;
        debug!("Fetched {} active buses", buses.len());
        Ok(buses)
    }

    pub async fn fetch_bus_stops(&self) -> Result<Vec<BusStop>> {
        let stops: Vec<BusStop> = self.http.get_json(&self.stops_url).await?;
        debug!("Fetched {} bus stops", stops.len());
        Ok(stops)
    }
}
