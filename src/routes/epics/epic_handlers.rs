use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use sqlx::SqlitePool;

use crate::access::task_with_role;
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::project_member::ProjectRole;
use crate::models::task::{Task, TaskType};
use crate::routes::tasks::task_handlers::{check_epic, refresh_rollups};
use crate::routes::tasks::task_models::TaskDetail;

async fn epic_with_role(
    pool: &SqlitePool,
    epic_id: i64,
    current: &CurrentUser,
    required: ProjectRole,
) -> ApiResult<Task> {
    let (epic, _) = task_with_role(pool, epic_id, current, required).await?;
    if epic.task_type != TaskType::Epic {
        return Err(ApiError::NotFound("Epic"));
    }
    Ok(epic)
}

pub async fn list_epic_tasks(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let epic = epic_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let tasks = Task::list_for_epic(pool.get_ref(), epic.id).await?;
    Ok(HttpResponse::Ok().json(TaskDetail::list(tasks)))
}

pub async fn add_epic_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (epic_id, task_id) = path.into_inner();
    let epic = epic_with_role(pool.get_ref(), epic_id, &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    let task = Task::find(&mut *tx, task_id)
        .await?
        .filter(|t| t.project_id == epic.project_id)
        .ok_or(ApiError::NotFound("Task"))?;
    check_epic(&mut tx, task.project_id, Some(task.id), epic.id).await?;

    Task::set_epic(&mut *tx, task.id, Some(epic.id)).await?;
    refresh_rollups(&mut tx, &[task.epic_id, Some(epic.id)], &[]).await?;
    let task = Task::find(&mut *tx, task.id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    tx.commit().await?;

    info!("Task {} added to epic {}", task.task_key(), epic.task_key());
    Ok(HttpResponse::Ok().json(TaskDetail::new(task, Utc::now().date_naive())))
}

pub async fn remove_epic_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (epic_id, task_id) = path.into_inner();
    let epic = epic_with_role(pool.get_ref(), epic_id, &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    let task = Task::find(&mut *tx, task_id)
        .await?
        .filter(|t| t.epic_id == Some(epic.id))
        .ok_or_else(|| ApiError::BadRequest("Task does not belong to this epic".into()))?;

    Task::set_epic(&mut *tx, task.id, None).await?;
    refresh_rollups(&mut tx, &[Some(epic.id)], &[]).await?;
    let task = Task::find(&mut *tx, task.id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(TaskDetail::new(task, Utc::now().date_naive())))
}

pub async fn refresh_epic_progress(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let epic = epic_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    refresh_rollups(&mut tx, &[Some(epic.id)], &[]).await?;
    let epic = Task::find(&mut *tx, epic.id)
        .await?
        .ok_or(ApiError::NotFound("Epic"))?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(TaskDetail::new(epic, Utc::now().date_naive())))
}
