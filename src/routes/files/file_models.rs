use serde::Serialize;

use crate::errors::{ApiError, ApiResult};
use crate::models::file_attachment::{allowed_file, extension_of, secure_filename, ALLOWED_EXTENSIONS};

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
pub struct FileDeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Names derived from the client-supplied filename.
#[derive(Debug, PartialEq)]
pub struct UploadName {
    pub original_filename: String,
    pub extension: String,
}

impl UploadName {
    pub fn parse(client_name: Option<&str>) -> ApiResult<Self> {
        let client_name = client_name.unwrap_or_default();
        if client_name.trim().is_empty() {
            return Err(ApiError::BadRequest("No file selected".into()));
        }

        let original_filename = secure_filename(client_name);
        if original_filename.is_empty() || !allowed_file(&original_filename) {
            return Err(ApiError::BadRequest(format!(
                "File type not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        Ok(UploadName {
            extension: extension_of(&original_filename),
            original_filename,
        })
    }

    /// Unique name the blob is stored under.
    pub fn stored_name(&self, id: uuid::Uuid) -> String {
        format!("{}.{}", id.simple(), self.extension)
    }
}
