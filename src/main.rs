use std::io;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use log::{error, info};

use tracker_backend::config::Config;
use tracker_backend::storage::Storage;
use tracker_backend::{configure_app, db};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = db::connect(&config.database_url, 5)
        .await
        .map_err(|e| startup_error("Failed to create pool", e))?;
    db::init(&pool)
        .await
        .map_err(|e| startup_error("Failed to prepare database", e))?;

    let storage = Storage::from_config(&config)
        .await
        .map_err(|e| startup_error("Failed to prepare file storage", e))?;
    info!("New uploads go to the {} backend", storage.active().storage_type());

    let server_address = config.bind_address.clone();
    info!("Server running at http://{}", server_address);

    let app = configure_app(pool, config, storage);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(app.clone())
    })
    .bind(server_address)?
    .run()
    .await
}
