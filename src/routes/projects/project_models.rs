use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::project::{Priority, Project, ProjectStatus};
use crate::models::project_member::{MemberDetail, ProjectRole};
use crate::routes::patch;

#[derive(Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub end_date: Option<Option<NaiveDate>>,
}

#[derive(Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: Project,
    pub role: ProjectRole,
    pub members: Vec<MemberDetail>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: i64,
    #[serde(default)]
    pub role: ProjectRole,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

pub fn validate_project_name(name: &str) -> ApiResult<()> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if len > 128 {
        return Err(ApiError::BadRequest("name is limited to 128 characters".into()));
    }
    Ok(())
}

pub fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ApiError::BadRequest(
            "end_date must not be before start_date".into(),
        )),
        _ => Ok(()),
    }
}

impl UpdateProjectRequest {
    pub fn apply_to(self, project: &mut Project) -> ApiResult<()> {
        if let Some(name) = self.name {
            validate_project_name(&name)?;
            project.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(priority) = self.priority {
            project.priority = priority;
        }
        patch::apply(&mut project.start_date, self.start_date);
        patch::apply(&mut project.end_date, self.end_date);
        validate_dates(project.start_date, project.end_date)
    }
}
