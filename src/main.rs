use actix_web::{
    middleware,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use log::info;
use serde_json::json;

use records_str::{config::Config, configure, db, schema, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;

    let db_pool = db::connect(&config).await.map_err(|e| {
        log::error!("FATAL: cannot open database {}: {}", config.database_url, e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    schema::ensure_schema(&db_pool).await.map_err(|e| {
        log::error!("FATAL: schema setup failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    let state = AppState::new(db_pool);

    info!(
        "Starting HTTP server on http://{}:{}/",
        config.host, config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .configure(configure)
            .default_service(web::to(default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn default_handler() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Not found" }))
}
