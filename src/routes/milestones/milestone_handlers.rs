use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use sqlx::SqlitePool;

use super::milestone_models::{
    validate_milestone_name, CreateMilestoneRequest, MilestoneDeleteResponse, MilestoneDetail,
    UpdateMilestoneRequest,
};
use crate::access::{effective_role, project_with_role};
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::milestone::Milestone;
use crate::models::project_member::ProjectRole;
use crate::models::task::Task;
use crate::routes::tasks::task_handlers::refresh_rollups;
use crate::routes::tasks::task_models::TaskDetail;

async fn milestone_with_role(
    pool: &SqlitePool,
    milestone_id: i64,
    current: &CurrentUser,
    required: ProjectRole,
) -> ApiResult<Milestone> {
    let milestone = Milestone::find(pool, milestone_id)
        .await?
        .ok_or(ApiError::NotFound("Milestone"))?;
    effective_role(pool, milestone.project_id, current)
        .await?
        .filter(|role| role.satisfies(required))
        .ok_or_else(ApiError::access_denied)?;
    Ok(milestone)
}

async fn milestone_detail(pool: &SqlitePool, milestone_id: i64) -> ApiResult<MilestoneDetail> {
    let summary = Milestone::find_summary(pool, milestone_id)
        .await?
        .ok_or(ApiError::NotFound("Milestone"))?;
    Ok(MilestoneDetail::new(summary, Utc::now().date_naive()))
}

pub async fn list_milestones(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let milestones = Milestone::list_for_project(pool.get_ref(), project.id).await?;
    Ok(HttpResponse::Ok().json(MilestoneDetail::list(milestones)))
}

pub async fn create_milestone(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<CreateMilestoneRequest>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    validate_milestone_name(&request.name)?;

    let milestone_id = Milestone::insert(
        pool.get_ref(),
        project.id,
        request.name.trim(),
        &request.description,
        request.target_date,
    )
    .await?;

    info!("User {} created milestone {} in {}", current.user.username, request.name, project.key);
    Ok(HttpResponse::Created().json(milestone_detail(pool.get_ref(), milestone_id).await?))
}

pub async fn update_milestone(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateMilestoneRequest>,
) -> ApiResult<HttpResponse> {
    let mut milestone =
        milestone_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    request
        .into_inner()
        .apply_to(&mut milestone, Utc::now().date_naive())?;

    // A status set by hand still yields to the roll-up once tasks are attached
    let mut tx = pool.begin().await?;
    milestone.save(&mut *tx).await?;
    Milestone::refresh_status(&mut tx, milestone.id).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(milestone_detail(pool.get_ref(), milestone.id).await?))
}

pub async fn delete_milestone(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let milestone =
        milestone_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    // Tasks keep existing with their milestone cleared
    Milestone::delete(pool.get_ref(), milestone.id).await?;

    info!("User {} deleted milestone {}", current.user.username, milestone.name);
    Ok(HttpResponse::Ok().json(MilestoneDeleteResponse {
        success: true,
        message: "Milestone deleted successfully".into(),
    }))
}

pub async fn list_milestone_tasks(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let milestone =
        milestone_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let tasks = Task::list_for_milestone(pool.get_ref(), milestone.id).await?;
    Ok(HttpResponse::Ok().json(TaskDetail::list(tasks)))
}

pub async fn add_milestone_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (milestone_id, task_id) = path.into_inner();
    let milestone =
        milestone_with_role(pool.get_ref(), milestone_id, &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    let task = Task::find(&mut *tx, task_id)
        .await?
        .filter(|t| t.project_id == milestone.project_id)
        .ok_or(ApiError::NotFound("Task"))?;
    Task::set_milestone(&mut *tx, task.id, Some(milestone.id)).await?;
    refresh_rollups(&mut tx, &[], &[task.milestone_id, Some(milestone.id)]).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(milestone_detail(pool.get_ref(), milestone.id).await?))
}

pub async fn remove_milestone_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (milestone_id, task_id) = path.into_inner();
    let milestone =
        milestone_with_role(pool.get_ref(), milestone_id, &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    let task = Task::find(&mut *tx, task_id)
        .await?
        .filter(|t| t.milestone_id == Some(milestone.id))
        .ok_or_else(|| ApiError::BadRequest("Task does not belong to this milestone".into()))?;
    Task::set_milestone(&mut *tx, task.id, None).await?;
    refresh_rollups(&mut tx, &[], &[Some(milestone.id)]).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(milestone_detail(pool.get_ref(), milestone.id).await?))
}
