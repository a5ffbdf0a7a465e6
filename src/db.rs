use std::str::FromStr;

use chrono::Utc;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::models::group::DEFAULT_GROUPS;
use crate::models::permission::DEFAULT_PERMISSIONS;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Applies pending migrations and seeds the default permissions and groups.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    seed_defaults(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    for (name, description) in DEFAULT_PERMISSIONS {
        sqlx::query("INSERT OR IGNORE INTO permissions (name, description, created_at) VALUES (?, ?, ?)")
            .bind(*name)
            .bind(*description)
            .bind(now)
            .execute(&mut *tx)
            .await?;
    }

    for (name, description, permissions) in DEFAULT_GROUPS {
        sqlx::query("INSERT OR IGNORE INTO groups (name, description, created_at) VALUES (?, ?, ?)")
            .bind(*name)
            .bind(*description)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for permission in *permissions {
            sqlx::query(
                "INSERT OR IGNORE INTO group_permissions (group_id, permission_id, granted_at)
                 SELECT g.id, p.id, ? FROM groups g, permissions p
                 WHERE g.name = ? AND p.name = ?",
            )
            .bind(now)
            .bind(*name)
            .bind(*permission)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await
}
