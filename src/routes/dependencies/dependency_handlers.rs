use actix_web::{web, HttpResponse};
use log::info;
use sqlx::{SqliteConnection, SqlitePool};

use super::dependency_models::{AddDependencyRequest, DependencyView};
use crate::access::task_with_role;
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::dependency::TaskDependency;
use crate::models::project_member::ProjectRole;
use crate::models::task::Task;

async fn dependency_view(conn: &mut SqliteConnection, task_id: i64) -> ApiResult<DependencyView> {
    let predecessors = Task::list_predecessors(&mut *conn, task_id).await?;
    let successors = Task::list_successors(&mut *conn, task_id).await?;
    Ok(DependencyView::new(task_id, predecessors, successors))
}

pub async fn list_dependencies(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let mut conn = pool.acquire().await?;
    Ok(HttpResponse::Ok().json(dependency_view(&mut conn, task.id).await?))
}

pub async fn add_dependency(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<AddDependencyRequest>,
) -> ApiResult<HttpResponse> {
    let (task, _) =
        task_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Member).await?;
    let predecessor_id = request.predecessor_id;
    if predecessor_id == task.id {
        return Err(ApiError::BadRequest("A task cannot depend on itself".into()));
    }

    let mut tx = pool.begin().await?;
    let predecessor = Task::find(&mut *tx, predecessor_id)
        .await?
        .filter(|t| t.project_id == task.project_id)
        .ok_or_else(|| {
            ApiError::BadRequest("predecessor_id must name a task in the same project".into())
        })?;
    if TaskDependency::find(&mut *tx, predecessor.id, task.id).await?.is_some() {
        return Err(ApiError::BadRequest("Dependency already exists".into()));
    }
    if TaskDependency::would_create_cycle(&mut *tx, predecessor.id, task.id).await? {
        return Err(ApiError::BadRequest("Dependency would create a cycle".into()));
    }
    TaskDependency::insert(&mut *tx, predecessor.id, task.id).await?;
    let view = dependency_view(&mut tx, task.id).await?;
    tx.commit().await?;

    info!("Task {} now depends on {}", task.task_key(), predecessor.task_key());
    Ok(HttpResponse::Created().json(view))
}

pub async fn remove_dependency(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (task_id, predecessor_id) = path.into_inner();
    let (task, _) = task_with_role(pool.get_ref(), task_id, &current, ProjectRole::Member).await?;

    let mut tx = pool.begin().await?;
    TaskDependency::find(&mut *tx, predecessor_id, task.id)
        .await?
        .ok_or(ApiError::NotFound("Dependency"))?;
    TaskDependency::delete(&mut *tx, predecessor_id, task.id).await?;
    let view = dependency_view(&mut tx, task.id).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(view))
}
