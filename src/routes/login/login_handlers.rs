use actix_web::{web, HttpResponse};
use log::info;
use sqlx::SqlitePool;

use super::login_models::{
    CheckEmailRequest, CheckEmailResponse, CheckUsernameRequest, CheckUsernameResponse,
    LoginRequest, LoginResponse, LogoutResponse, MeResponse, RegisterRequest, RegisterResponse,
};
use crate::auth::{hash_password, verify_password, CurrentUser, SessionKeys};
use crate::config::Config;
use crate::errors::{ApiError, ApiResult};
use crate::models::group::{Group, DEFAULT_USER_GROUP};
use crate::models::session::Session;
use crate::models::user::{NewUser, User};

// Check if username is unique
pub async fn check_username(
    pool: web::Data<SqlitePool>,
    req: web::Json<CheckUsernameRequest>,
) -> ApiResult<HttpResponse> {
    let is_unique = !User::username_taken(pool.get_ref(), &req.username).await?;
    info!("Username {} is unique: {}", req.username, is_unique);
    Ok(HttpResponse::Ok().json(CheckUsernameResponse { is_unique }))
}

// Check if email is unique
pub async fn check_email(
    pool: web::Data<SqlitePool>,
    req: web::Json<CheckEmailRequest>,
) -> ApiResult<HttpResponse> {
    let is_unique = !User::email_taken(pool.get_ref(), &req.email).await?;
    info!("Email {} is unique: {}", req.email, is_unique);
    Ok(HttpResponse::Ok().json(CheckEmailResponse { is_unique }))
}

// register user to DB
pub async fn register(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    req: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    req.validate()?;
    info!("Received request to register user: {}", req.username);

    if User::username_taken(pool.get_ref(), &req.username).await? {
        return Err(ApiError::Conflict("Username is already taken".into()));
    }
    if User::email_taken(pool.get_ref(), &req.email).await? {
        return Err(ApiError::Conflict("Email is already registered".into()));
    }

    let password_hash = hash_password(&req.password, config.bcrypt_cost)?;

    let mut tx = pool.begin().await?;
    let user_id = User::insert(
        &mut *tx,
        &NewUser {
            username: &req.username,
            email: &req.email,
            password_hash: &password_hash,
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
        },
    )
    .await?;

    // New accounts join the default group when it exists
    if let Some(group) = Group::find_by_name(&mut *tx, DEFAULT_USER_GROUP).await? {
        Group::add_user(&mut *tx, group.id, user_id).await?;
    }

    let user = User::find(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("user vanished after insert".into()))?;
    tx.commit().await?;

    info!("User {} registered successfully", user.username);
    Ok(HttpResponse::Created().json(RegisterResponse {
        success: true,
        message: "User registered successfully".into(),
        user: user.summary(),
    }))
}

// login logic
pub async fn login(
    pool: web::Data<SqlitePool>,
    keys: web::Data<SessionKeys>,
    req: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    info!("Received login request for user: {}", req.username);

    let user = match User::find_by_username(pool.get_ref(), &req.username).await? {
        Some(user) => user,
        None => {
            info!("Invalid username: {}", req.username);
            return Err(ApiError::Unauthorized("Invalid username or password".into()));
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        info!("Invalid password for user: {}", req.username);
        return Err(ApiError::Unauthorized("Invalid username or password".into()));
    }

    if !user.is_active {
        info!("Deactivated account tried to log in: {}", req.username);
        return Err(ApiError::Forbidden("Account is deactivated".into()));
    }

    let purged = Session::delete_expired_for_user(pool.get_ref(), user.id).await?;
    if purged > 0 {
        info!("Removed {} expired sessions for user {}", purged, user.username);
    }

    let session = Session::create(pool.get_ref(), user.id, req.remember_me).await?;
    User::touch_last_login(pool.get_ref(), user.id).await?;

    info!("User {} logged in successfully", user.username);
    Ok(HttpResponse::Ok()
        .cookie(keys.session_cookie(&session))
        .json(LoginResponse {
            success: true,
            message: "Login successful".into(),
            user: user.summary(),
        }))
}

pub async fn logout(
    pool: web::Data<SqlitePool>,
    keys: web::Data<SessionKeys>,
    current: CurrentUser,
) -> ApiResult<HttpResponse> {
    Session::delete(pool.get_ref(), &current.session_id).await?;
    info!("Logout successful for user: {}", current.user.username);

    Ok(HttpResponse::Ok()
        .cookie(keys.removal_cookie())
        .json(LogoutResponse {
            success: true,
            message: "Logout successful".into(),
        }))
}

pub async fn me(pool: web::Data<SqlitePool>, current: CurrentUser) -> ApiResult<HttpResponse> {
    let groups = Group::list_for_user(pool.get_ref(), current.id()).await?;
    Ok(HttpResponse::Ok().json(MeResponse {
        user: current.user.summary(),
        groups,
        permissions: current.permissions.names(),
    }))
}
