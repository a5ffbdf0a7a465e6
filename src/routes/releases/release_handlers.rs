use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use sqlx::SqlitePool;

use super::release_models::{CreateReleaseRequest, ReleaseDeleteResponse, UpdateReleaseRequest};
use crate::access::{effective_role, project_with_role};
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::project_member::ProjectRole;
use crate::models::release::Release;

async fn release_with_role(
    pool: &SqlitePool,
    release_id: i64,
    current: &CurrentUser,
    required: ProjectRole,
) -> ApiResult<Release> {
    let release = Release::find(pool, release_id)
        .await?
        .ok_or(ApiError::NotFound("Release"))?;
    effective_role(pool, release.project_id, current)
        .await?
        .filter(|role| role.satisfies(required))
        .ok_or_else(ApiError::access_denied)?;
    Ok(release)
}

pub async fn list_releases(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    Ok(HttpResponse::Ok().json(Release::list_for_project(pool.get_ref(), project.id).await?))
}

pub async fn create_release(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<CreateReleaseRequest>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;
    let new_release = request.into_inner().into_new_release()?;

    let id = Release::insert(pool.get_ref(), project.id, &new_release).await?;
    let release = Release::find(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::NotFound("Release"))?;

    info!("User {} created release {} in {}", current.user.username, release.name, project.key);
    Ok(HttpResponse::Created().json(release))
}

pub async fn update_release(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateReleaseRequest>,
) -> ApiResult<HttpResponse> {
    let mut release =
        release_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;
    request.into_inner().apply_to(&mut release, Utc::now())?;
    release.save(pool.get_ref()).await?;

    let release = Release::find(pool.get_ref(), release.id)
        .await?
        .ok_or(ApiError::NotFound("Release"))?;
    Ok(HttpResponse::Ok().json(release))
}

pub async fn delete_release(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let release =
        release_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    Release::delete(pool.get_ref(), release.id).await?;

    info!("User {} deleted release {}", current.user.username, release.name);
    Ok(HttpResponse::Ok().json(ReleaseDeleteResponse {
        success: true,
        message: "Release deleted successfully".into(),
    }))
}
