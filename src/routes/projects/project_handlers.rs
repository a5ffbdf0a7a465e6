use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::project_models::{
    validate_dates, validate_project_name, AddMemberRequest, CreateProjectRequest, DeleteResponse,
    ProjectDetailResponse, UpdateProjectRequest,
};
use crate::access::project_with_role;
use crate::auth::CurrentUser;
use crate::errors::{ApiError, ApiResult};
use crate::models::file_attachment::FileAttachment;
use crate::models::permission::{CREATE_PROJECT, DELETE_PROJECT, VIEW_ALL_PROJECTS};
use crate::models::project::{NewProject, Project};
use crate::models::project_member::{ProjectMember, ProjectRole};
use crate::models::user::User;
use crate::routes::tasks::task_handlers::remove_blobs;
use crate::storage::Storage;

// Projects the caller is a member of, or every project for view_all_projects holders
pub async fn list_projects(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
) -> ApiResult<HttpResponse> {
    let projects = if current.can(VIEW_ALL_PROJECTS) {
        Project::list_all(pool.get_ref()).await?
    } else {
        Project::list_for_member(pool.get_ref(), current.id()).await?
    };
    Ok(HttpResponse::Ok().json(projects))
}

pub async fn create_project(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    request: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    current.require(CREATE_PROJECT)?;
    let request = request.into_inner();
    validate_project_name(&request.name)?;
    validate_dates(request.start_date, request.end_date)?;
    let name = request.name.trim();

    // Key allocation, project row and owner membership commit together
    let mut tx = pool.begin().await?;
    let key = Project::next_available_key(&mut *tx, name).await?;
    let project_id = Project::insert(
        &mut *tx,
        &NewProject {
            name,
            key: &key,
            description: &request.description,
            status: request.status,
            priority: request.priority,
            start_date: request.start_date,
            end_date: request.end_date,
            creator_id: current.id(),
        },
    )
    .await?;
    ProjectMember::insert(&mut *tx, project_id, current.id(), ProjectRole::Owner).await?;
    let project = Project::find(&mut *tx, project_id)
        .await?
        .ok_or_else(|| ApiError::Internal("project vanished after insert".into()))?;
    tx.commit().await?;

    info!("User {} created project {} ({})", current.user.username, project.name, project.key);
    Ok(HttpResponse::Created().json(project))
}

pub async fn get_project(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (project, role) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let members = ProjectMember::list_detailed(pool.get_ref(), project.id).await?;
    Ok(HttpResponse::Ok().json(ProjectDetailResponse {
        project,
        role,
        members,
    }))
}

pub async fn update_project(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let (mut project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    request.into_inner().apply_to(&mut project)?;
    project.save(pool.get_ref()).await?;

    let project = Project::find(pool.get_ref(), project.id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project(
    pool: web::Data<SqlitePool>,
    storage: web::Data<Storage>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (project, role) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    if role != ProjectRole::Owner && !current.can(DELETE_PROJECT) {
        return Err(ApiError::access_denied());
    }

    // Rows go with the cascade; blobs are removed afterwards
    let attachments = FileAttachment::list_for_project(pool.get_ref(), project.id).await?;
    Project::delete(pool.get_ref(), project.id).await?;
    remove_blobs(&storage, &attachments).await;

    info!("User {} deleted project {}", current.user.username, project.key);
    Ok(HttpResponse::Ok().json(DeleteResponse {
        success: true,
        message: "Project deleted successfully".into(),
    }))
}

pub async fn list_members(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let (project, _) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Viewer).await?;
    let members = ProjectMember::list_detailed(pool.get_ref(), project.id).await?;
    Ok(HttpResponse::Ok().json(members))
}

pub async fn add_member(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<AddMemberRequest>,
) -> ApiResult<HttpResponse> {
    let (project, role) =
        project_with_role(pool.get_ref(), path.into_inner(), &current, ProjectRole::Admin).await?;
    if request.role == ProjectRole::Owner && role != ProjectRole::Owner {
        return Err(ApiError::Forbidden("Only owners can add owners".into()));
    }

    let user = User::find(pool.get_ref(), request.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if ProjectMember::find(pool.get_ref(), project.id, user.id).await?.is_some() {
        return Err(ApiError::BadRequest("User is already a member".into()));
    }

    ProjectMember::insert(pool.get_ref(), project.id, user.id, request.role).await?;
    let member = ProjectMember::list_detailed(pool.get_ref(), project.id)
        .await?
        .into_iter()
        .find(|m| m.user_id == user.id)
        .ok_or_else(|| ApiError::Internal("member vanished after insert".into()))?;

    info!("User {} added {} to project {}", current.user.username, user.username, project.key);
    Ok(HttpResponse::Created().json(member))
}

pub async fn remove_member(
    pool: web::Data<SqlitePool>,
    current: CurrentUser,
    path: web::Path<(i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (project_id, user_id) = path.into_inner();
    let (project, role) =
        project_with_role(pool.get_ref(), project_id, &current, ProjectRole::Admin).await?;

    let member = ProjectMember::find(pool.get_ref(), project.id, user_id)
        .await?
        .ok_or(ApiError::NotFound("Member"))?;

    if member.role == ProjectRole::Owner {
        if role != ProjectRole::Owner {
            return Err(ApiError::Forbidden("Only owners can remove owners".into()));
        }
        if ProjectMember::count_owners(pool.get_ref(), project.id).await? <= 1 {
            return Err(ApiError::BadRequest("Cannot remove the last owner".into()));
        }
    }

    ProjectMember::delete(pool.get_ref(), member.id).await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        success: true,
        message: "Member removed successfully".into(),
    }))
}
