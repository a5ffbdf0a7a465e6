use actix_web::{web, HttpResponse};
use log::warn;
use sqlx::SqlitePool;

use super::admin_models::SessionResetResponse;
use crate::auth::CurrentUser;
use crate::errors::ApiResult;
use crate::models::permission::ADMIN_USERS;
use crate::models::session::Session;

// Logs every user out, the caller included
pub async fn session_reset(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
) -> ApiResult<HttpResponse> {
    current.require(ADMIN_USERS)?;
    let removed = Session::delete_all(pool.get_ref()).await?;
    warn!("User {} reset all sessions ({} removed)", current.user.username, removed);

    Ok(HttpResponse::Ok().json(SessionResetResponse {
        success: true,
        message: "All sessions have been reset successfully".into(),
        removed,
    }))
}
