use crate::config::AppConfig;
use crate::db::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::{handle, App};
use astra::Server;
use env_logger::Env;
use std::net::SocketAddr;
use std::time::Duration;

mod api;
mod auth;
mod config;
#[macro_use]
mod domain;
mod db;
mod errors;
mod lifecycle;
mod responses;
mod router;


fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Configuration could not be loaded, using defaults: {e}");
            AppConfig::default()
        }
    };

    let db = Database::new(
        config.database.path.clone(),
        Duration::from_millis(config.database.busy_timeout_ms),
    );
    if let Err(e) = init_db(&db, &config.database.schema_path) {
        log::error!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    let addr: SocketAddr = match config.server.bind.parse() {
        Ok(a) => a,
        Err(e) => {
            log::error!("Invalid bind address {}: {e}", config.server.bind);
            std::process::exit(1);
        }
    };
    log::info!(
        "Starting server at http://{addr} with {} workers",
        config.server.max_workers
    );

    let app = App::new(db, &config);
    let server = Server::bind(&addr).max_workers(config.server.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        log::error!("Server ended with error: {e}");
    }

    log::info!("Server shut down cleanly.");
}
