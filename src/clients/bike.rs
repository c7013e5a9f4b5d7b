// Bike-share client. The GBFS feed is split in two: `station_status` carries
// availability counts, `station_information` carries names and coordinates.
// A usable station needs both, joined on `station_id`.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::HttpFetcher;
use crate::error::{FetchError, Result};
use crate::models::{BikeStation, json_id};

type StationRecord = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct GbfsFeed {
    data: GbfsStations,
}

#[derive(Debug, Deserialize)]
struct GbfsStations {
    stations: Vec<StationRecord>,
}

#[derive(Debug, Clone)]
pub struct BikeStationClient {
    http: HttpFetcher,
    status_url: String,
    information_url: String,
}

/// Result of joining status records against information records.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub stations: Vec<BikeStation>,
    /// Status station ids with no information record.
    pub unmatched: Vec<String>,
    /// Records that matched but could not be turned into a station.
    pub invalid: Vec<FetchError>,
}

impl BikeStationClient {
    pub fn new(
        http: HttpFetcher,
        status_url: impl Into<String>,
        information_url: impl Into<String>,
    ) -> Self {
        BikeStationClient {
            http,
            status_url: status_url.into(),
            information_url: information_url.into(),
        }
    }

    /// Fetches both halves of the feed concurrently and joins them. Fails
    /// as a whole if either request fails.
    pub async fn fetch_bike_stations(&self) -> Result<Vec<BikeStation>> {
        let (status, information) = tokio::try_join!(
            self.http.get_json::<GbfsFeed>(&self.status_url),
            self.http.get_json::<GbfsFeed>(&self.information_url),
        )?;

        let outcome = merge_stations(status.data.stations, information.data.stations);

        for station_id in &outcome.unmatched {
            debug!("{}", FetchError::JoinMiss(station_id.clone()));
        }
        for err in &outcome.invalid {
            warn!("Skipping bike station: {}", err);
        }
        debug!(
            "Joined {} bike stations ({} unmatched, {} invalid)",
            outcome.stations.len(),
            outcome.unmatched.len(),
            outcome.invalid.len()
        );

        Ok(outcome.stations)
    }
}

/// Inner join on `station_id`, in status order.
///
/// Each output record is the union of the information and status fields;
/// status wins on key collision. If information ids repeat, the first
/// record with that id is used. Status records with no information record
/// are left out and reported in [`JoinOutcome::unmatched`].
pub fn merge_stations(status: Vec<StationRecord>, information: Vec<StationRecord>) -> JoinOutcome {
    let mut info_by_id: HashMap<String, StationRecord> = HashMap::with_capacity(information.len());
    for record in information {
        if let Some(id) = record.get("station_id").and_then(json_id) {
            info_by_id.entry(id).or_insert(record);
        }
    }

    let mut outcome = JoinOutcome::default();

    for record in status {
        let Some(id) = record.get("station_id").and_then(json_id) else {
            outcome.invalid.push(FetchError::ParseError(
                "Status record without station_id".to_string(),
            ));
            continue;
        };

        let Some(info) = info_by_id.get(&id) else {
            outcome.unmatched.push(id);
            continue;
        };

        let mut merged = info.clone();
        merged.extend(record);

        match BikeStation::from_merged(merged) {
            Ok(station) => outcome.stations.push(station),
            Err(e) => outcome.invalid.push(e),
        }
    }

    outcome
}
