use actix::Addr;
use actix_web::{error, web, Error, HttpResponse, Responder};

use crate::simul::{GetPoolView, SimulCoordinator};

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Simul Chess")
}

/// Current pool view as JSON
pub async fn pool(coordinator: web::Data<Addr<SimulCoordinator>>) -> Result<HttpResponse, Error> {
    let view = coordinator
        .send(GetPoolView)
        .await
        .map_err(error::ErrorServiceUnavailable)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/pool").route(web::get().to(pool)))
        .service(web::resource("/").route(web::get().to(index)));
}
