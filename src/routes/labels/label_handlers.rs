use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::label_models::CreateLabelRequest;
use crate::access::task_with_role;
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::label::Label;
use crate::models::project_member::ProjectRole;

pub async fn list_labels(
    pool: web::Data<SqlitePool>,
    _current: CurrentUser,
) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(Label::list_all(pool.get_ref()).await?))
}

pub async fn create_label(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    request: web::Json<CreateLabelRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;
    let name = request.name.trim();
    if Label::find_by_name(pool.get_ref(), name).await?.is_some() {
        return Err(ApiError::Conflict("Label already exists".into()));
    }

    let id = Label::insert(
        pool.get_ref(),
        name,
        request.color.as_deref(),
        request.description.as_deref(),
    )
    .await?;
    let label = Label::find(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound("Label"))?;

    info!("User {} created label {}", current.user.username, label.name);
    Ok(HttpResponse::Created().json(label))
}

pub async fn list_task_labels(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    Ok(HttpResponse::Ok().json(Label::list_for_task(pool.get_ref(), task.id).await?))
}

pub async fn add_task_label(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (task_id, label_id) = path.into_inner();
    let (task, _) = task_with_role(pool.get_ref(), task_id, &current, ProjectRole::Member).await?;
    let label = Label::find(pool.get_ref(), label_id)
        .await?
        .ok_or(ApiError::NotFound("Label"))?;

    if !Label::attach(pool.get_ref(), task.id, label.id).await? {
        return Err(ApiError::BadRequest("Task already has this label".into()));
    }
    Ok(HttpResponse::Ok().json(Label::list_for_task(pool.get_ref(), task.id).await?))
}

pub async fn remove_task_label(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (task_id, label_id) = path.into_inner();
    let (task, _) = task_with_role(pool.get_ref(), task_id, &current, ProjectRole::Member).await?;

    if !Label::detach(pool.get_ref(), task.id, label_id).await? {
        return Err(ApiError::NotFound("Label assignment"));
    }
    Ok(HttpResponse::Ok().json(Label::list_for_task(pool.get_ref(), task.id).await?))
}
