pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod storage;

use actix_web::web;

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::storage::Storage;
use sqlx::SqlitePool;

/// Shared state every worker receives, plus the routes.
pub fn configure_app(
    pool: SqlitePool,
    config: Config,
    storage: Storage,
) -> impl FnOnce(&mut web::ServiceConfig) + Clone {
    let keys = SessionKeys::from_secret(&config.secret_key);
    move |cfg: &mut web::ServiceConfig| {
        let json_limit = config.max_content_length;
        cfg.app_data(web::Data::new(pool))
            .app_data(web::Data::new(keys))
            .app_data(web::Data::new(storage))
            .app_data(web::Data::new(config))
            .app_data(
                web::JsonConfig::default()
                    .limit(json_limit)
                    .error_handler(errors::json_error_handler),
            )
            .app_data(web::QueryConfig::default().error_handler(errors::query_error_handler))
            .app_data(web::PathConfig::default().error_handler(errors::path_error_handler))
            .configure(routes::routes::configure);
    }
}
