use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::user_models::{MembershipResponse, UpdateUserRequest, UserDetailResponse};
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::group::Group;
use crate::models::permission::ADMIN_USERS;
use crate::models::user::User;

pub async fn list_users(
    pool: web::Data<SqlitePool>,
    _current: CurrentUser,
) -> ApiResult<HttpResponse> {
    let users: Vec<_> = User::list_all(pool.get_ref())
        .await?
        .iter()
        .map(User::summary)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn get_user(
    pool: web::Data<SqlitePool>,
    _current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user = User::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let groups = Group::list_for_user(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(UserDetailResponse {
        user: user.summary(),
        groups,
    }))
}

pub async fn update_user(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();
    let can_admin = current.can(ADMIN_USERS);
    if user_id != current.id() && !can_admin {
        return Err(ApiError::access_denied());
    }

    let mut user = User::find(pool.get_ref(), user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let old_email = user.email.clone();
    request.into_inner().apply_to(&mut user, can_admin)?;
    if user.email != old_email && User::email_taken(pool.get_ref(), &user.email).await? {
        return Err(ApiError::Conflict("Email is already registered".into()));
    }
    user.update_profile(pool.get_ref()).await?;

    let groups = Group::list_for_user(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(UserDetailResponse {
        user: user.summary(),
        groups,
    }))
}

pub async fn add_user_to_group(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    current.require(ADMIN_USERS)?;
    let (user_id, group_id) = path.into_inner();
    let user = User::find(pool.get_ref(), user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    let group = Group::find(pool.get_ref(), group_id)
        .await?
        .ok_or(ApiError::NotFound("Group"))?;

    if !Group::add_user(pool.get_ref(), group.id, user.id).await? {
        return Err(ApiError::BadRequest("User is already in this group".into()));
    }
    info!("User {} added {} to group {}", current.user.username, user.username, group.name);
    Ok(HttpResponse::Ok().json(MembershipResponse {
        success: true,
        message: format!("User added to group {}", group.name),
    }))
}

pub async fn remove_user_from_group(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    current.require(ADMIN_USERS)?;
    let (user_id, group_id) = path.into_inner();
    let group = Group::find(pool.get_ref(), group_id)
        .await?
        .ok_or(ApiError::NotFound("Group"))?;

    if !Group::remove_user(pool.get_ref(), group.id, user_id).await? {
        return Err(ApiError::NotFound("Group membership"));
    }
    info!("User {} removed user {} from group {}", current.user.username, user_id, group.name);
    Ok(HttpResponse::Ok().json(MembershipResponse {
        success: true,
        message: format!("User removed from group {}", group.name),
    }))
}
