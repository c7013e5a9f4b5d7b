// Campus transit server: polls the shuttle and bike-share feeds and serves
// the merged view model to the map front end.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use campus_transit_live::api::{self, AppState};
use campus_transit_live::config::AppConfig;
use campus_transit_live::logger::init_logger;

#[derive(Parser, Debug)]
#[command(
    name = "campus-transit-live",
    version,
    about = "Serve live shuttle and bike-share data for the campus map"
)]
struct Args {
    /// JSON config file; any omitted field keeps its default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
}

// ============================================================================
// Server Setup
// ============================================================================

async fn run_server(config: AppConfig, app_state: AppState) -> std::io::Result<()> {
    let poller = app_state.poller.clone();
    poller.start();

    let bind = config.http.bind.clone();
    let port = config.http.port;

    info!("🌐 Server running on: http://{}:{}", bind, port);
    info!("📡 Map view at: http://{}:{}/api/view", bind, port);
    info!(
        "🔄 Buses every {:?}, stations every {:?}",
        poller.bus_interval(),
        poller.station_interval()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(api::configure)
    })
    .bind((bind.as_str(), port))?
    .run()
    .await
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> std::io::Result<()> {
    init_logger();
    let args = Args::parse();

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }

    let timezone = match config.display_timezone() {
        Ok(tz) => tz,
        Err(e) => {
            error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let poller = match campus_transit_live::build_poller(&config) {
        Ok(poller) => poller,
        Err(e) => {
            error!("❌ Failed to set up feed clients: {}", e);
            std::process::exit(1);
        }
    };

    if config.endpoints.search.is_none() {
        info!("No search endpoint configured; /api/search will answer 503");
    }

    let app_state = AppState {
        poller,
        route_styles: config.route_styles.clone(),
        timezone,
    };

    actix_web::rt::System::new().block_on(run_server(config, app_state))
}
