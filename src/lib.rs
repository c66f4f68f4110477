use actix_web::{error::InternalError, web, HttpResponse};
use serde_json::json;
use sqlx::SqlitePool;

pub mod config;
pub mod db;
pub mod errors;
pub mod kinds;
pub mod records;
pub mod routes;
pub mod schema;
pub mod structs;
pub mod utils;

/// Shared by every handler. The pool lives from startup to shutdown.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

impl AppState {
    pub fn new(db_pool: SqlitePool) -> Self {
        AppState { db_pool }
    }
}

/// Registers every route plus the JSON extractor configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_cfg = web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON body: {}", err);
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "message": message })),
        )
        .into()
    });

    // a non-numeric `{id}` is an unknown record, not a malformed request
    let path_cfg = web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("Not found: {}", err);
        InternalError::from_response(
            err,
            HttpResponse::NotFound().json(json!({ "message": message })),
        )
        .into()
    });

    cfg.app_data(json_cfg)
        .app_data(path_cfg)
        .service(routes::health_handler)
        .service(routes::register_handler)
        .service(routes::login_handler)
        .service(routes::list_handler)
        .service(routes::create_handler)
        .service(routes::update_handler)
        .service(routes::delete_handler);
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    db::memory_pool().await.unwrap()
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let pool = test_pool().await;
    schema::ensure_schema(&pool).await.unwrap();
    AppState::new(pool)
}
