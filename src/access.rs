use sqlx::sqlite::SqliteExecutor;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::permission::VIEW_ALL_PROJECTS;
use crate::models::project::Project;
use crate::models::project_member::{ProjectMember, ProjectRole};
use crate::models::task::Task;

/// Role the user effectively holds in a project. Holders of
/// `view_all_projects` read every project as viewers.
pub async fn effective_role<'e, E: SqliteExecutor<'e>>(
    executor: E,
    project_id: i64,
    user: &CurrentUser,
) -> ApiResult<Option<ProjectRole>> {
    let membership = ProjectMember::find(executor, project_id, user.id()).await?;
    Ok(match membership {
        Some(member) => Some(member.role),
        None if user.can(VIEW_ALL_PROJECTS) => Some(ProjectRole::Viewer),
        None => None,
    })
}

/// Loads a project and checks the user holds at least `required` in it.
pub async fn project_with_role(
    pool: &SqlitePool,
    project_id: i64,
    user: &CurrentUser,
    required: ProjectRole,
) -> ApiResult<(Project, ProjectRole)> {
    let project = Project::find(pool, project_id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    let role = effective_role(pool, project_id, user)
        .await?
        .filter(|role| role.satisfies(required))
        .ok_or_else(ApiError::access_denied)?;
    Ok((project, role))
}

pub async fn task_with_role(
    pool: &SqlitePool,
    task_id: i64,
    user: &CurrentUser,
    required: ProjectRole,
) -> ApiResult<(Task, ProjectRole)> {
    let task = Task::find(pool, task_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    let role = effective_role(pool, task.project_id, user)
        .await?
        .filter(|role| role.satisfies(required))
        .ok_or_else(ApiError::access_denied)?;
    Ok((task, role))
}
