use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{BikeStation, BusPosition, BusStop, MapRegion, Position};

/// Data sources feeding the view. Each one is fetched and applied
/// independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Buses,
    Stops,
    Stations,
    Search,
    Location,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Buses,
        Source::Stops,
        Source::Stations,
        Source::Search,
        Source::Location,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Source::Buses => "buses",
            Source::Stops => "stops",
            Source::Stations => "stations",
            Source::Search => "search",
            Source::Location => "location",
        }
    }
}

/// Snapshot consumed by the renderer.
///
/// Never mutated in place: every change goes through one of the `with_*`
/// functions below, which return the next snapshot and leave `self` intact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub bus_positions: Vec<BusPosition>,
    pub bus_stops: Vec<BusStop>,
    pub bike_stations: Vec<BikeStation>,
    pub search_results: Vec<Position>,
    pub map_region: MapRegion,
    pub show_available_bikes: bool,
    pub tracking_location: bool,
    pub user_location: Option<Position>,
    /// Unix timestamp of the last applied update per source.
    pub updated_at: BTreeMap<Source, i64>,
}

impl ViewState {
    pub fn new(map_region: MapRegion) -> Self {
        ViewState {
            bus_positions: Vec::new(),
            bus_stops: Vec::new(),
            bike_stations: Vec::new(),
            search_results: Vec::new(),
            map_region,
            show_available_bikes: true,
            tracking_location: false,
            user_location: None,
            updated_at: BTreeMap::new(),
        }
    }

    pub fn with_bus_positions(&self, bus_positions: Vec<BusPosition>) -> Self {
        ViewState {
            bus_positions,
            ..self.clone()
        }
    }

    pub fn with_bus_stops(&self, bus_stops: Vec<BusStop>) -> Self {
        ViewState {
            bus_stops,
            ..self.clone()
        }
    }

    pub fn with_bike_stations(&self, bike_stations: Vec<BikeStation>) -> Self {
        ViewState {
            bike_stations,
            ..self.clone()
        }
    }

    /// Replaces the pins. A non-empty result moves the map onto the best
    /// match; an empty one only clears the pins.
    pub fn with_search_results(&self, search_results: Vec<Position>) -> Self {
        let map_region = search_results
            .first()
            .and_then(|best| self.map_region.recentered(*best).ok())
            .unwrap_or(self.map_region);

        ViewState {
            search_results,
            map_region,
            ..self.clone()
        }
    }

    pub fn with_show_available_bikes_toggled(&self) -> Self {
        ViewState {
            show_available_bikes: !self.show_available_bikes,
            ..self.clone()
        }
    }

    pub fn with_tracking_location(&self, tracking_location: bool) -> Self {
        ViewState {
            tracking_location,
            ..self.clone()
        }
    }

    /// Records the device position; recenters only while tracking is on.
    pub fn with_user_location(&self, position: Position) -> Self {
        let map_region = if self.tracking_location {
            self.map_region.recentered(position).unwrap_or(self.map_region)
        } else {
            self.map_region
        };

        ViewState {
            user_location: Some(position),
            map_region,
            ..self.clone()
        }
    }

    pub(crate) fn stamped(mut self, source: Source, timestamp: i64) -> Self {
        self.updated_at.insert(source, timestamp);
        self
    }
}
