use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::group::Group;
use crate::models::user::{User, UserSummary};
use crate::routes::login::login_models::validate_email;
use crate::routes::patch;

#[derive(Serialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub groups: Vec<Group>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "patch::nullable")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub last_name: Option<Option<String>>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct MembershipResponse {
    pub success: bool,
    pub message: String,
}

impl UpdateUserRequest {
    /// Applies profile fields. Only user administrators may toggle
    /// `is_active`.
    pub fn apply_to(self, user: &mut User, can_admin: bool) -> ApiResult<()> {
        if self.is_active.is_some() && !can_admin {
            return Err(ApiError::Forbidden("Only user administrators can change is_active".into()));
        }
        for name in [&self.first_name, &self.last_name].into_iter().flatten().flatten() {
            if name.chars().count() > 64 {
                return Err(ApiError::BadRequest("names are limited to 64 characters".into()));
            }
        }
        if let Some(email) = self.email {
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        patch::apply(&mut user.first_name, self.first_name);
        patch::apply(&mut user.last_name, self.last_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 5,
            username: "grace".into(),
            email: "grace@example.com".into(),
            password_hash: String::new(),
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn regular_users_cannot_deactivate() {
        let request: UpdateUserRequest = serde_json::from_str(r#"{"is_active": false}"#).unwrap();
        assert!(matches!(
            request.apply_to(&mut user(), false),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn profile_fields_can_be_cleared() {
        let mut u = user();
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"last_name": null, "email": "gh@example.org"}"#).unwrap();
        request.apply_to(&mut u, false).unwrap();
        assert_eq!(u.last_name, None);
        assert_eq!(u.first_name.as_deref(), Some("Grace"));
        assert_eq!(u.email, "gh@example.org");
    }
}
