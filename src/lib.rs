//! Live campus transit data for a map front end: shuttle positions, bus
//! stops and bike-share availability, polled from their upstream feeds and
//! merged into one view model.

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod location;
pub mod logger;
pub mod models;
pub mod poller;
pub mod state;
pub mod store;
pub mod view;

use std::sync::Arc;

use crate::clients::{BikeStationClient, HttpFetcher, SearchClient, TransitClient};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::location::{FixedLocationProvider, LocationProvider};
use crate::poller::Poller;
use crate::store::ViewStore;

pub use crate::error::{FetchError, Result};

/// Wires clients, store and poller from a configuration. Polling does not
/// start until [`Poller::start`] is called.
pub fn build_poller(config: &AppConfig) -> std::result::Result<Arc<Poller>, ConfigError> {
    let location: Arc<dyn LocationProvider> = Arc::new(FixedLocationProvider::from(config.location));
    build_poller_with_location(config, location)
}

pub fn build_poller_with_location(
    config: &AppConfig,
    location: Arc<dyn LocationProvider>,
) -> std::result::Result<Arc<Poller>, ConfigError> {
    let http = HttpFetcher::new(config.request_timeout())
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    let endpoints = &config.endpoints;

    let store = Arc::new(ViewStore::with_region(config.initial_region()?));
    let transit = TransitClient::new(http.clone(), &endpoints.buses, &endpoints.stops);
    let bikes = BikeStationClient::new(
        http.clone(),
        &endpoints.station_status,
        &endpoints.station_information,
    );
    let search = SearchClient::new(http, endpoints.search.clone());

    Ok(Arc::new(Poller::new(
        store,
        transit,
        bikes,
        search,
        location,
        config.polling.clone(),
    )))
}
