// ============================================================================
// Renderer-facing HTTP API
// ============================================================================
//
// The map front end reads snapshots from here and reports user events
// (bike/dock toggle, manual refresh, search, location toggle) back.

use actix_web::{HttpResponse, web};
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::models::RouteStyles;
use crate::poller::{PollOutcome, Poller, SchedulerState};
use crate::state::Source;
use crate::view::MapView;

#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
    pub route_styles: RouteStyles,
    pub timezone: Tz,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    fn error(message: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now().timestamp(),
        }
    }
}

fn fetch_error_response(e: &FetchError) -> HttpResponse {
    let body = ApiResponse::<()>::error(e.to_string());
    match e {
        FetchError::NotConfigured(_) => HttpResponse::ServiceUnavailable().json(body),
        FetchError::PermissionDenied => HttpResponse::Forbidden().json(body),
        _ => HttpResponse::BadGateway().json(body),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
}

#[derive(Debug, Serialize)]
struct ViewStats {
    scheduler: SchedulerState,
    buses: usize,
    stops: usize,
    stations: usize,
    search_results: usize,
    show_available_bikes: bool,
    tracking_location: bool,
    last_updates: BTreeMap<Source, String>,
}

pub fn format_timestamp(timestamp: i64, timezone: Tz) -> String {
    match Utc.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.with_timezone(&timezone).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("Invalid timestamp: {}", timestamp),
    }
}

// ============================================================================
// Snapshots
// ============================================================================

async fn get_view(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(MapView::render(&snapshot, &state.route_styles)))
}

async fn get_state(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(&*snapshot))
}

async fn get_buses(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(&snapshot.bus_positions))
}

async fn get_stops(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(&snapshot.bus_stops))
}

async fn get_stations(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(&snapshot.bike_stations))
}

async fn get_search_results(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    HttpResponse::Ok().json(ApiResponse::success(&snapshot.search_results))
}

async fn get_stats(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.poller.store().snapshot();
    let stats = ViewStats {
        scheduler: state.poller.state(),
        buses: snapshot.bus_positions.len(),
        stops: snapshot.bus_stops.len(),
        stations: snapshot.bike_stations.len(),
        search_results: snapshot.search_results.len(),
        show_available_bikes: snapshot.show_available_bikes,
        tracking_location: snapshot.tracking_location,
        last_updates: snapshot
            .updated_at
            .iter()
            .map(|(source, ts)| (*source, format_timestamp(*ts, state.timezone)))
            .collect(),
    };
    HttpResponse::Ok().json(ApiResponse::success(stats))
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Campus Transit Live",
        "version": env!("CARGO_PKG_VERSION"),
        "scheduler": state.poller.state(),
        "timestamp": Utc::now().timestamp(),
    }))
}

// ============================================================================
// User events
// ============================================================================

async fn toggle_bikes(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state
        .poller
        .store()
        .update(|view| view.with_show_available_bikes_toggled());
    info!(
        "Station markers now show {}",
        if snapshot.show_available_bikes { "bikes" } else { "docks" }
    );
    HttpResponse::Ok().json(ApiResponse::success(MapView::render(&snapshot, &state.route_styles)))
}

async fn force_refresh(state: web::Data<AppState>) -> HttpResponse {
    match state.poller.refresh_stations().await {
        PollOutcome::Applied => {
            HttpResponse::Ok().json(ApiResponse::success("Stations refreshed"))
        }
        PollOutcome::Skipped => {
            HttpResponse::Accepted().json(ApiResponse::success("Station refresh already in progress"))
        }
        PollOutcome::Stale => {
            HttpResponse::Ok().json(ApiResponse::success("Stations already up to date"))
        }
        PollOutcome::Failed(e) => fetch_error_response(&e),
    }
}

async fn submit_search(state: web::Data<AppState>, body: web::Json<SearchBody>) -> HttpResponse {
    match state.poller.search(&body.query).await {
        Ok(positions) => HttpResponse::Ok().json(ApiResponse::success(positions)),
        Err(e) => fetch_error_response(&e),
    }
}

async fn toggle_location(state: web::Data<AppState>) -> HttpResponse {
    match state.poller.toggle_location_tracking().await {
        Ok(tracking) => HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
            "tracking_location": tracking
        }))),
        Err(e) => {
            warn!("⚠️  Location toggle failed: {}", e);
            fetch_error_response(&e)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .route("/view", web::get().to(get_view))
            .route("/state", web::get().to(get_state))
            .route("/buses", web::get().to(get_buses))
            .route("/stops", web::get().to(get_stops))
            .route("/stations", web::get().to(get_stations))
            .route("/search-results", web::get().to(get_search_results))
            .route("/stats", web::get().to(get_stats))
            .route("/toggle-bikes", web::post().to(toggle_bikes))
            .route("/refresh", web::post().to(force_refresh))
            .route("/search", web::post().to(submit_search))
            .route("/location/toggle", web::post().to(toggle_location)),
    );
}
