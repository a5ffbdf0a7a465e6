use serde::Serialize;

#[derive(Serialize)]
pub struct SessionResetResponse {
    pub success: bool,
    pub message: String,
    pub removed: u64,
}
