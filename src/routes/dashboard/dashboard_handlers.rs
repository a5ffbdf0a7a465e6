use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::errors::ApiResult;
use crate::models::project::Project;
use crate::models::task::Task;
use crate::routes::tasks::task_models::TaskDetail;

const RECENT_TASKS: i64 = 10;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub projects: Vec<Project>,
    pub recent_tasks: Vec<TaskDetail>,
    pub overdue_tasks: Vec<TaskDetail>,
}

// projects the caller belongs to, their latest assignments and what is late
pub async fn dashboard(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
) -> ApiResult<HttpResponse> {
    let today = Utc::now().date_naive();
    let projects = Project::list_for_member(pool.get_ref(), current.id()).await?;
    let recent = Task::recent_for_assignee(pool.get_ref(), current.id(), RECENT_TASKS).await?;
    let overdue = Task::overdue_for_member(pool.get_ref(), current.id(), today).await?;

    Ok(HttpResponse::Ok().json(DashboardResponse {
        projects,
        recent_tasks: TaskDetail::list(recent),
        overdue_tasks: TaskDetail::list(overdue),
    }))
}
