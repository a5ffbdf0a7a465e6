use std::collections::BTreeSet;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use sqlx::{SqliteConnection, SqlitePool};

use super::task_models::{
    CreateTaskRequest, TaskDeleteResponse, TaskDetail, TaskQuery, UpdateTaskRequest,
};
use crate::access::{project_with_role, task_with_role};
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::file_attachment::FileAttachment;
use crate::models::milestone::Milestone;
use crate::models::project_member::{ProjectMember, ProjectRole};
use crate::models::task::{Task, TaskFilter, TaskType};
use crate::storage::Storage;

pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    query: web::Query<TaskQuery>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let filter = TaskFilter::from(query.into_inner());
    let tasks = Task::list_for_project(pool.get_ref(), project.id, &filter).await?;
    Ok(HttpResponse::Ok().json(TaskDetail::list(tasks)))
}

pub async fn create_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<CreateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;
    let new_task = request.into_inner().into_new_task(project.id)?;

    let mut tx = pool.begin().await?;
    if let Some(epic_id) = new_task.epic_id {
        check_epic(&mut tx, project.id, None, epic_id).await?;
    }
    if let Some(milestone_id) = new_task.milestone_id {
        check_milestone(&mut tx, project.id, milestone_id).await?;
    }
    if let Some(assignee_id) = new_task.assignee_id {
        check_assignee(&mut tx, project.id, assignee_id).await?;
    }

    let task_number = Task::next_task_number(&mut *tx, project.id).await?;
    let task_id = Task::insert(&mut *tx, task_number, &new_task).await?;
    refresh_rollups(&mut tx, &[new_task.epic_id], &[new_task.milestone_id]).await?;
    let task = Task::find(&mut *tx, task_id)
        .await?
        .ok_or_else(|| ApiError::Internal("task vanished after insert".into()))?;
    tx.commit().await?;

    info!("User {} created task {}", current.user.username, task.task_key());
    Ok(HttpResponse::Created().json(TaskDetail::new(task, Utc::now().date_naive())))
}

pub async fn get_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    Ok(HttpResponse::Ok().json(TaskDetail::new(task, Utc::now().date_naive())))
}

pub async fn update_task(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let task_id = path.into_inner();
    task_with_role(pool.get_ref(), task_id, &current, ProjectRole::Member).await?;

    // Take the write lock before reading so concurrent edits apply in turn
    let mut tx = pool.begin().await?;
    Task::touch(&mut *tx, task_id).await?;
    let mut task = Task::find(&mut *tx, task_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    let before = task.clone();
    request.into_inner().apply_to(&mut task, Utc::now())?;

    if before.task_type == TaskType::Epic
        && task.task_type != TaskType::Epic
        && !Task::list_for_epic(&mut *tx, task.id).await?.is_empty()
    {
        return Err(ApiError::BadRequest(
            "An epic with child tasks cannot change type".into(),
        ));
    }
    if let Some(epic_id) = task.epic_id.filter(|_| task.epic_id != before.epic_id) {
        check_epic(&mut tx, task.project_id, Some(task.id), epic_id).await?;
    }
    if let Some(milestone_id) = task.milestone_id.filter(|_| task.milestone_id != before.milestone_id) {
        check_milestone(&mut tx, task.project_id, milestone_id).await?;
    }
    if let Some(assignee_id) = task.assignee_id.filter(|_| task.assignee_id != before.assignee_id) {
        check_assignee(&mut tx, task.project_id, assignee_id).await?;
    }

    task.save(&mut *tx).await?;
    refresh_rollups(
        &mut tx,
        &[before.epic_id, task.epic_id],
        &[before.milestone_id, task.milestone_id],
    )
    .await?;
    let task = Task::find(&mut *tx, task.id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(TaskDetail::new(task, Utc::now().date_naive())))
}

pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    storage: web::Data<Storage>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    let attachments = FileAttachment::list_for_task(pool.get_ref(), task.id).await?;

    // Attachment rows cascade and epic children are detached by the schema
    let mut tx = pool.begin().await?;
    Task::delete(&mut *tx, task.id).await?;
    refresh_rollups(&mut tx, &[task.epic_id], &[task.milestone_id]).await?;
    tx.commit().await?;

    remove_blobs(&storage, &attachments).await;
    info!("User {} deleted task {}", current.user.username, task.task_key());
    Ok(HttpResponse::Ok().json(TaskDeleteResponse {
        success: true,
        message: "Task deleted successfully".into(),
    }))
}

/// Best-effort removal of blobs whose rows are already gone.
pub(crate) async fn remove_blobs(storage: &Storage, attachments: &[FileAttachment]) {
    for attachment in attachments {
        let result = match storage.backend(attachment.storage_type) {
            Ok(backend) => backend.delete(&attachment.storage_key).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to remove blob {}: {}", attachment.storage_key, e);
        }
    }
}

/// Recomputes epic progress and milestone status for every id given once.
pub(crate) async fn refresh_rollups(
    conn: &mut SqliteConnection,
    epic_ids: &[Option<i64>],
    milestone_ids: &[Option<i64>],
) -> Result<(), sqlx::Error> {
    let epics: BTreeSet<i64> = epic_ids.iter().flatten().copied().collect();
    for epic_id in epics {
        Task::refresh_epic_progress(&mut *conn, epic_id).await?;
    }
    let milestones: BTreeSet<i64> = milestone_ids.iter().flatten().copied().collect();
    for milestone_id in milestones {
        Milestone::refresh_status(&mut *conn, milestone_id).await?;
    }
    Ok(())
}

pub(crate) async fn check_epic(
    conn: &mut SqliteConnection,
    project_id: i64,
    task_id: Option<i64>,
    epic_id: i64,
) -> ApiResult<Task> {
    if task_id == Some(epic_id) {
        return Err(ApiError::BadRequest("A task cannot be its own epic".into()));
    }
    let epic = Task::find(&mut *conn, epic_id)
        .await?
        .filter(|epic| epic.project_id == project_id && epic.task_type == TaskType::Epic)
        .ok_or_else(|| ApiError::BadRequest("epic_id must name an epic in the same project".into()))?;

    if let Some(task_id) = task_id {
        let mut visited = BTreeSet::new();
        let mut parent = epic.epic_id;
        while let Some(id) = parent {
            if id == task_id {
                return Err(ApiError::BadRequest(
                    "Epic assignment would create a cycle".into(),
                ));
            }
            if !visited.insert(id) {
                break;
            }
            parent = Task::find(&mut *conn, id).await?.and_then(|t| t.epic_id);
        }
    }
    Ok(epic)
}

pub(crate) async fn check_milestone(
    conn: &mut SqliteConnection,
    project_id: i64,
    milestone_id: i64,
) -> ApiResult<Milestone> {
    Milestone::find(&mut *conn, milestone_id)
        .await?
        .filter(|milestone| milestone.project_id == project_id)
        .ok_or_else(|| {
            ApiError::BadRequest("milestone_id must name a milestone in the same project".into())
        })
}

async fn check_assignee(conn: &mut SqliteConnection, project_id: i64, user_id: i64) -> ApiResult<()> {
    match ProjectMember::find(&mut *conn, project_id, user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::BadRequest(
            "assignee_id must name a member of the project".into(),
        )),
    }
}
