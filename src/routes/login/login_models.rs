use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::group::Group;
use crate::models::user::UserSummary;

// Username check request and response
#[derive(Deserialize)]
pub struct CheckUsernameRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct CheckUsernameResponse {
    pub is_unique: bool,
}

// Email check request and response
#[derive(Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct CheckEmailResponse {
    pub is_unique: bool,
}

// Registration request and response
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

// Login request and response
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

// Logout response
#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: UserSummary,
    pub groups: Vec<Group>,
    pub permissions: Vec<String>,
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_username(username: &str) -> ApiResult<()> {
    let len = username.chars().count();
    if !(4..=20).contains(&len) {
        return Err(ApiError::BadRequest(
            "username must be between 4 and 20 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ApiError::BadRequest(
            "username may only contain letters, digits, '.', '_' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ApiResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
                && email.len() <= 120
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest("email is not a valid address".into()))
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::BadRequest(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        for name in [&self.first_name, &self.last_name].into_iter().flatten() {
            if name.chars().count() > 64 {
                return Err(ApiError::BadRequest("names are limited to 64 characters".into()));
            }
        }
        Ok(())
    }
}
