use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod notify;
mod routes;
mod state;
mod store;
mod utils;

#[cfg(test)]
mod test_utils;

use config::Config;
use db::init_db;
use state::AppState;
use store::{MemoryStore, MySqlStore, Store};

use crate::docs::ApiDoc;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

const WARMUP_BATCH_SIZE: usize = 500;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(MySqlStore::new(init_db(url).await?)),
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Data::new(AppState::new(store, &config)?);
    let limiter = routes::scan_limiter(config.rate_scan_per_min)?;

    let state_for_warmup = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = state_for_warmup.warmup(WARMUP_BATCH_SIZE).await {
            error!(error = %e, "Failed to warm up UID index");
        }
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, &limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
