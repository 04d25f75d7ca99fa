use actix::Actor;
use actix_web::{web, App, HttpServer};
use log::info;
use std::io;

use simul_chess::config::{EngineConfig, ServerConfig};
use simul_chess::routes::configure_routes;
use simul_chess::simul::{Scheduler, SimulCoordinator};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let engine =
        EngineConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let server = ServerConfig::from_env();

    let scheduler = Scheduler::new(engine.tick_period).start();
    let coordinator = web::Data::new(SimulCoordinator::new(engine, scheduler).start());

    info!("Starting simul chess server at http://{}", server.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(coordinator.clone())
            .configure(configure_routes)
    })
    .bind(server.bind_addr.as_str())?
    .run()
    .await
}
