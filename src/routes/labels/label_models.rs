use serde::Deserialize;

use crate::errors::{ApiError, ApiResult};
use crate::models::label::valid_color;

#[derive(Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl CreateLabelRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let len = self.name.trim().chars().count();
        if len == 0 || len > 100 {
            return Err(ApiError::BadRequest(
                "name must be between 1 and 100 characters".into(),
            ));
        }
        if let Some(color) = &self.color {
            if !valid_color(color) {
                return Err(ApiError::BadRequest("color must look like #RRGGBB".into()));
            }
        }
        Ok(())
    }
}
