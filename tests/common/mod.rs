// Stub upstream feeds served by actix-web on an ephemeral port.

#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use campus_transit_live::config::{AppConfig, Endpoints};

#[derive(Debug, Clone)]
pub struct Upstream {
    pub buses: Value,
    pub stops: Value,
    pub station_status: Value,
    pub station_information: Value,
    pub fail_stations: bool,
    pub bus_delay: Duration,
    /// Requests served per route path.
    pub hits: HashMap<&'static str, usize>,
}

impl Upstream {
    fn hit(&mut self, route: &'static str) {
        *self.hits.entry(route).or_insert(0) += 1;
    }
}

impl Default for Upstream {
    fn default() -> Self {
        Upstream {
            buses: json!([
                {"lat": "40.9124", "lon": "-73.1233", "routeID": "4"},
                {"lat": "40.9101", "lon": "-73.1207", "routeID": "3"},
            ]),
            stops: json!([
                {"lat": "40.9157", "lon": "-73.1235"},
                {"lat": 40.9113, "lon": -73.1196},
            ]),
            station_status: json!({
                "last_updated": 1705338000,
                "data": {"stations": [
                    {"station_id": "1", "num_bikes_available": 3, "num_docks_available": 7, "is_renting": 1},
                    {"station_id": "2", "num_bikes_available": 0, "num_docks_available": 0, "is_renting": 0},
                    {"station_id": "404", "num_bikes_available": 5, "num_docks_available": 5},
                ]}
            }),
            station_information: json!({
                "last_updated": 1705338000,
                "data": {"stations": [
                    {"station_id": "1", "name": "Library", "lat": 40.9157, "lon": -73.1235, "capacity": 10},
                    {"station_id": "2", "name": "SAC", "lat": 40.9141, "lon": -73.1244, "capacity": 12},
                ]}
            }),
            fail_stations: false,
            bus_delay: Duration::ZERO,
            hits: HashMap::new(),
        }
    }
}

pub struct StubServer {
    pub base: String,
    pub upstream: Arc<Mutex<Upstream>>,
    handle: ServerHandle,
}

impl StubServer {
    pub fn set<F: FnOnce(&mut Upstream)>(&self, change: F) {
        change(&mut self.upstream.lock().unwrap());
    }

    pub fn hits(&self, route: &str) -> usize {
        self.upstream.lock().unwrap().hits.get(route).copied().unwrap_or(0)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Config pointing every feed at this stub.
    pub fn config(&self, with_search: bool) -> AppConfig {
        AppConfig {
            endpoints: Endpoints {
                buses: self.url("/buses"),
                stops: self.url("/stops"),
                station_status: self.url("/gbfs/station_status"),
                station_information: self.url("/gbfs/station_information"),
                search: with_search.then(|| self.url("/search")),
            },
            ..AppConfig::default()
        }
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

async fn buses(upstream: web::Data<Mutex<Upstream>>) -> HttpResponse {
    let (body, delay) = {
        let mut upstream = upstream.lock().unwrap();
        upstream.hit("/buses");
        (upstream.buses.clone(), upstream.bus_delay)
    };
    if !delay.is_zero() {
        actix_web::rt::time::sleep(delay).await;
    }
    HttpResponse::Ok().json(body)
}

async fn stops(upstream: web::Data<Mutex<Upstream>>) -> HttpResponse {
    let mut upstream = upstream.lock().unwrap();
    upstream.hit("/stops");
    HttpResponse::Ok().json(upstream.stops.clone())
}

async fn station_status(upstream: web::Data<Mutex<Upstream>>) -> HttpResponse {
    let mut upstream = upstream.lock().unwrap();
    upstream.hit("/gbfs/station_status");
    if upstream.fail_stations {
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok().json(upstream.station_status.clone())
}

async fn station_information(upstream: web::Data<Mutex<Upstream>>) -> HttpResponse {
    let mut upstream = upstream.lock().unwrap();
    upstream.hit("/gbfs/station_information");
    HttpResponse::Ok().json(upstream.station_information.clone())
}

#[derive(Deserialize)]
struct SearchBody {
    query: String,
}

async fn search(body: web::Json<SearchBody>) -> HttpResponse {
    match body.query.as_str() {
        "library" => HttpResponse::Ok().json(json!({"items": [
            {"position": [40.9157, -73.1235], "title": "Frank Melville Library"},
            {"position": [40.9150, -73.1220], "title": "Library Parking"},
        ]})),
        "slow library" => {
            actix_web::rt::time::sleep(Duration::from_millis(300)).await;
            HttpResponse::Ok().json(json!({"items": [{"position": [40.0, -73.0]}]}))
        }
        "nowhere" => HttpResponse::Ok().json(json!({"items": []})),
        "garbled" => HttpResponse::Ok().content_type("application/json").body("{\"items\": ["),
        _ => HttpResponse::InternalServerError().finish(),
    }
}

pub async fn start_stub(upstream: Upstream) -> StubServer {
    let upstream = Arc::new(Mutex::new(upstream));
    let data = web::Data::from(upstream.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/buses", web::get().to(buses))
            .route("/stops", web::get().to(stops))
            .route("/gbfs/station_status", web::get().to(station_status))
            .route("/gbfs/station_information", web::get().to(station_information))
            .route("/search", web::post().to(search))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind stub server");

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    StubServer {
        base: format!("http://{}", addr),
        upstream,
        handle,
    }
}

/// Polls `check` until it holds or the timeout runs out.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        actix_web::rt::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
