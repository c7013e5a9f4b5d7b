// Render projection: turns a `ViewState` snapshot into exactly what the map
// front end draws, so the client needs no lookup tables or arithmetic.

use serde::Serialize;

use crate::models::{MapRegion, Position, RouteStyles};
use crate::state::ViewState;

pub const BIKES_ICON: &str = "directions-bike";
pub const DOCKS_ICON: &str = "lock-open";

/// Share of the station's slots that are bikes (or free docks), floored to
/// a whole percent. A station with no slots at all reads as empty.
pub fn fill_percent(bikes: u32, docks: u32, show_available_bikes: bool) -> u8 {
    let total = u64::from(bikes) + u64::from(docks);
    if total == 0 {
        return 0;
    }
    let selected = if show_available_bikes { bikes } else { docks };
    (u64::from(selected) * 100 / total) as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusMarker {
    pub position: Position,
    pub route_id: String,
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMarker {
    pub station_id: String,
    pub name: String,
    pub position: Position,
    pub fill_percent: u8,
    /// Bikes or free docks, depending on the display mode.
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub region: MapRegion,
    pub bus_markers: Vec<BusMarker>,
    pub stop_markers: Vec<Position>,
    pub station_markers: Vec<StationMarker>,
    pub search_pins: Vec<Position>,
    pub user_location: Option<Position>,
    pub tracking_location: bool,
    pub show_available_bikes: bool,
    pub bike_mode_icon: &'static str,
}

impl MapView {
    pub fn render(state: &ViewState, styles: &RouteStyles) -> Self {
        let bus_markers = state
            .bus_positions
            .iter()
            .map(|bus| {
                let style = styles.style_for(&bus.route_id);
                BusMarker {
                    position: Position::new(bus.latitude, bus.longitude),
                    route_id: bus.route_id.clone(),
                    color: style.color,
                    label: style.label,
                }
            })
            .collect();

        let stop_markers = state
            .bus_stops
            .iter()
            .map(|stop| Position::new(stop.latitude, stop.longitude))
            .collect();

        let show_bikes = state.show_available_bikes;
        let station_markers = state
            .bike_stations
            .iter()
            .map(|station| StationMarker {
                station_id: station.station_id.clone(),
                name: station.name.clone(),
                position: station.position(),
                fill_percent: fill_percent(
                    station.num_bikes_available,
                    station.num_docks_available,
                    show_bikes,
                ),
                count: if show_bikes {
                    station.num_bikes_available
                } else {
                    station.num_docks_available
                },
            })
            .collect();

        MapView {
            region: state.map_region,
            bus_markers,
            stop_markers,
            station_markers,
            search_pins: state.search_results.clone(),
            user_location: state.user_location,
            tracking_location: state.tracking_location,
            show_available_bikes: show_bikes,
            bike_mode_icon: if show_bikes { BIKES_ICON } else { DOCKS_ICON },
        }
    }
}
