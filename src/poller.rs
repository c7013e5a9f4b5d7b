// ============================================================================
// Poller
// ============================================================================
//
// Drives the feed clients and publishes their results into the store.
// Buses and bike stations repeat on fixed intervals; stops and the user's
// location are fetched once when polling starts. User actions that need a
// network round trip (manual refresh, search, location toggle) go through
// here as well so they share the same ticketing.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clients::{BikeStationClient, SearchClient, TransitClient};
use crate::config::PollingParams;
use crate::error::{FetchError, Result};
use crate::location::LocationProvider;
use crate::models::Position;
use crate::state::{Source, ViewState};
use crate::store::ViewStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Polling,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Applied,
    /// A fetch for the same source was still outstanding.
    Skipped,
    /// A newer response had already been applied.
    Stale,
    Failed(FetchError),
}

pub struct Poller {
    store: Arc<ViewStore>,
    transit: TransitClient,
    bikes: BikeStationClient,
    search: SearchClient,
    location: Arc<dyn LocationProvider>,
    polling: PollingParams,
    started: AtomicBool,
    // Held for a whole location toggle so two taps cannot both read "off".
    toggle_lock: tokio::sync::Mutex<()>,
}

impl Poller {
    pub fn new(
        store: Arc<ViewStore>,
        transit: TransitClient,
        bikes: BikeStationClient,
        search: SearchClient,
        location: Arc<dyn LocationProvider>,
        polling: PollingParams,
    ) -> Self {
        Poller {
            store,
            transit,
            bikes,
            search,
            location,
            polling,
            started: AtomicBool::new(false),
            toggle_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<ViewStore> {
        &self.store
    }

    pub fn state(&self) -> SchedulerState {
        if self.started.load(Ordering::Acquire) {
            SchedulerState::Polling
        } else {
            SchedulerState::Idle
        }
    }

    /// Idle -> Polling. Fires the one-time fetches and the first bus poll
    /// right away, then keeps buses and stations on their intervals until
    /// the runtime shuts down. Returns `false` if polling already started.
    pub fn start(self: &Arc<Self>) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        info!(
            "🔄 Polling started: buses every {}ms, stations every {}ms",
            self.polling.bus_interval_ms, self.polling.station_interval_ms
        );

        let poller = self.clone();
        tokio::spawn(async move {
            poller.poll_stops().await;
        });

        let poller = self.clone();
        tokio::spawn(async move {
            poller.poll_stations().await;
        });

        let poller = self.clone();
        tokio::spawn(async move {
            poller.locate().await;
        });

        // The first interval tick completes immediately, which is the
        // initial bus fetch.
        let poller = self.clone();
        let bus_interval = self.polling.bus_interval();
        tokio::spawn(async move {
            let mut interval = time::interval(bus_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let poller = poller.clone();
                tokio::spawn(async move {
                    poller.poll_buses().await;
                });
            }
        });

        let poller = self.clone();
        let station_interval = self.polling.station_interval();
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + station_interval, station_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let poller = poller.clone();
                tokio::spawn(async move {
                    poller.poll_stations().await;
                });
            }
        });

        true
    }

    pub async fn poll_buses(&self) -> PollOutcome {
        self.run_poll(Source::Buses, self.transit.fetch_active_buses(), |state, buses| {
            state.with_bus_positions(buses)
        })
        .await
    }

    pub async fn poll_stops(&self) -> PollOutcome {
        self.run_poll(Source::Stops, self.transit.fetch_bus_stops(), |state, stops| {
            state.with_bus_stops(stops)
        })
        .await
    }

    pub async fn poll_stations(&self) -> PollOutcome {
        self.run_poll(Source::Stations, self.bikes.fetch_bike_stations(), |state, stations| {
            state.with_bike_stations(stations)
        })
        .await
    }

    /// Out-of-band station poll requested by the user. Shares the station
    /// in-flight guard with the timer.
    pub async fn refresh_stations(&self) -> PollOutcome {
        info!("Manual station refresh requested");
        self.poll_stations().await
    }

    /// One-shot location lookup. Nothing is recorded without permission.
    pub async fn locate(&self) -> PollOutcome {
        if !self.location.request_permission().await {
            info!("Location permission denied; continuing without user position");
            return PollOutcome::Failed(FetchError::PermissionDenied);
        }

        self.run_poll(Source::Location, self.location.current_position(), |state, position| {
            state.with_user_location(position)
        })
        .await
    }

    /// Flips location tracking and returns the new setting. Turning it on
    /// needs permission and a position fix; on failure tracking stays off.
    pub async fn toggle_location_tracking(&self) -> Result<bool> {
        let _toggling = self.toggle_lock.lock().await;

        if self.store.snapshot().tracking_location {
            self.store.update(|state| state.with_tracking_location(false));
            info!("Location tracking off");
            return Ok(false);
        }

        if !self.location.request_permission().await {
            return Err(FetchError::PermissionDenied);
        }

        let ticket = self.store.issue(Source::Location);
        let position = self.location.current_position().await?;
        let enable = |state: &ViewState| state.with_tracking_location(true).with_user_location(position);
        if !self.store.apply(ticket, enable) {
            self.store.update(|state| state.with_tracking_location(true));
        }

        info!("Location tracking on at {:.6}, {:.6}", position.latitude, position.longitude);
        Ok(true)
    }

    /// Runs one query and publishes the result unless a later query has
    /// already landed. A blank query clears the pins without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<Position>> {
        let ticket = self.store.issue(Source::Search);

        let query = query.trim();
        let positions = if query.is_empty() {
            Vec::new()
        } else {
            self.search.search(query).await.inspect_err(|e| {
                warn!("⚠️  Search '{}' failed, keeping previous results: {}", query, e);
            })?
        };

        let published = positions.clone();
        if !self.store.apply(ticket, move |state| state.with_search_results(published)) {
            debug!("Search '{}' superseded by a newer query", query);
        }

        Ok(positions)
    }

    async fn run_poll<T, Fut, U>(&self, source: Source, fetch: Fut, update: U) -> PollOutcome
    where
        Fut: Future<Output = Result<T>>,
        U: FnOnce(&ViewState, T) -> ViewState,
    {
        let Some(ticket) = self.store.try_begin(source) else {
            debug!("Skipping {} poll: previous request still in flight", source.name());
            return PollOutcome::Skipped;
        };

        match fetch.await {
            Ok(data) => {
                if self.store.apply(ticket, |state| update(state, data)) {
                    debug!("✓ {} updated", source.name());
                    PollOutcome::Applied
                } else {
                    PollOutcome::Stale
                }
            }
            Err(e) => {
                warn!("⚠️  {} poll failed, keeping previous data: {}", source.name(), e);
                PollOutcome::Failed(e)
            }
        }
    }

    pub fn bus_interval(&self) -> Duration {
        self.polling.bus_interval()
    }

    pub fn station_interval(&self) -> Duration {
        self.polling.station_interval()
    }
}
