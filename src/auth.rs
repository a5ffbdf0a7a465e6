//! Session-cookie authentication.
//!
//! Login stores a session row and hands the client its id in an http-only
//! cookie signed with `SECRET_KEY`. Handlers that take a [`CurrentUser`]
//! argument only run for requests carrying a valid, unexpired session.

use actix_web::cookie::{Cookie, CookieJar, Key, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use log::info;
use sqlx::SqlitePool;

use crate::errors::{ApiError, ApiResult};
use crate::models::permission::PermissionSet;
use crate::models::session::Session;
use crate::models::user::User;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Clone)]
pub struct SessionKeys {
    key: Key,
}

impl SessionKeys {
    /// `secret` must be at least 32 bytes; `Config` enforces this.
    pub fn from_secret(secret: &str) -> Self {
        SessionKeys {
            key: Key::derive_from(secret.as_bytes()),
        }
    }

    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, session.session_id.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        if session.is_persistent {
            let lifetime = Session::lifetime(true).num_seconds();
            cookie.set_max_age(time::Duration::seconds(lifetime));
        }

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie.clone());
        jar.get(SESSION_COOKIE).cloned().unwrap_or(cookie)
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
        cookie.make_removal();
        cookie
    }

    /// Session id carried by a cookie, if its signature checks out.
    pub fn verify(&self, cookie: Cookie<'static>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        jar.signed(&self.key)
            .get(SESSION_COOKIE)
            .map(|verified| verified.value().to_string())
    }
}

pub fn hash_password(password: &str, cost: u32) -> ApiResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

/// The authenticated caller of a request.
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
    pub permissions: PermissionSet,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn can(&self, permission: &str) -> bool {
        self.permissions.has(permission)
    }

    pub fn require(&self, permission: &str) -> ApiResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(ApiError::access_denied())
        }
    }
}

async fn authenticate(
    pool: web::Data<SqlitePool>,
    keys: web::Data<SessionKeys>,
    cookie: Option<Cookie<'static>>,
) -> ApiResult<CurrentUser> {
    let cookie = cookie.ok_or_else(ApiError::login_required)?;
    let session_id = keys
        .verify(cookie)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session ID".into()))?;

    let session = Session::find(pool.get_ref(), &session_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session ID".into()))?;

    if session.is_expired(Utc::now()) {
        Session::delete(pool.get_ref(), &session_id).await?;
        info!("Session expired for user {}", session.user_id);
        return Err(ApiError::Unauthorized("Login is needed, session expired".into()));
    }

    let user = User::find(pool.get_ref(), session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session ID".into()))?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    let permissions = PermissionSet::load(pool.get_ref(), user.id, user.is_admin).await?;
    Ok(CurrentUser {
        user,
        session_id,
        permissions,
    })
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<SqlitePool>>().cloned();
        let keys = req.app_data::<web::Data<SessionKeys>>().cloned();
        let cookie = req.cookie(SESSION_COOKIE);

        Box::pin(async move {
            match (pool, keys) {
                (Some(pool), Some(keys)) => authenticate(pool, keys, cookie).await,
                _ => Err(ApiError::Internal(
                    "database pool or session keys not registered".into(),
                )),
            }
        })
    }
}
