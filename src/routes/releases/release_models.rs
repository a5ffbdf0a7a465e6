use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::release::{NewRelease, Release, ReleaseStatus};
use crate::routes::patch;

#[derive(Deserialize)]
pub struct CreateReleaseRequest {
    pub name: String,
    pub version: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub status: ReleaseStatus,
    pub description: Option<String>,
    pub repo_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateReleaseRequest {
    pub name: Option<String>,
    pub status: Option<ReleaseStatus>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub version: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub tag: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub repo_url: Option<Option<String>>,
}

#[derive(Serialize)]
pub struct ReleaseDeleteResponse {
    pub success: bool,
    pub message: String,
}

fn validate_release_name(name: &str) -> ApiResult<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(ApiError::BadRequest("name must be between 1 and 255 characters".into()));
    }
    Ok(())
}

impl CreateReleaseRequest {
    pub fn into_new_release(self) -> ApiResult<NewRelease> {
        validate_release_name(&self.name)?;
        Ok(NewRelease {
            name: self.name.trim().to_string(),
            version: self.version,
            tag: self.tag,
            status: self.status,
            description: self.description,
            repo_url: self.repo_url,
        })
    }
}

impl UpdateReleaseRequest {
    pub fn apply_to(self, release: &mut Release, now: DateTime<Utc>) -> ApiResult<()> {
        if let Some(name) = self.name {
            validate_release_name(&name)?;
            release.name = name.trim().to_string();
        }
        if let Some(status) = self.status {
            release.set_status(status, now);
        }
        patch::apply(&mut release.version, self.version);
        patch::apply(&mut release.tag, self.tag);
        patch::apply(&mut release.description, self.description);
        patch::apply(&mut release.repo_url, self.repo_url);
        Ok(())
    }
}
