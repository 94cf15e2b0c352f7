use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};

use super::handlers::{configure, AppState};

/// Bind the read-side HTTP server. The returned server must be awaited (or
/// spawned) to start serving; its handle is used for graceful shutdown.
pub fn build_http_server(state: web::Data<AppState>, port: u16) -> std::io::Result<Server> {
    tracing::info!("🌐 Starting HTTP server on http://0.0.0.0:{}", port);

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(("0.0.0.0", port))?
        .run();

    Ok(server)
}
