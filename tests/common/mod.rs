#![allow(dead_code, unused_macros)]

use std::path::Path;

use sqlx::SqlitePool;
use tempfile::TempDir;
use tracker_backend::config::Config;
use tracker_backend::db;
use tracker_backend::models::group::Group;
use tracker_backend::storage::Storage;

pub const PASSWORD: &str = "correct-horse-battery";
pub const MAX_UPLOAD: usize = 4096;

pub struct TestEnv {
    pub pool: SqlitePool,
    pub config: Config,
    pub storage: Storage,
    uploads: TempDir,
}

impl TestEnv {
    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Adds the user to the seeded `admins` group.
    pub async fn make_admin(&self, user_id: i64) {
        let group = Group::find_by_name(&self.pool, "admins").await.unwrap().unwrap();
        Group::add_user(&self.pool, group.id, user_id).await.unwrap();
    }
}

pub async fn setup() -> TestEnv {
    let uploads = tempfile::tempdir().unwrap();
    let upload_folder = uploads.path().display().to_string();
    let config = Config::from_lookup(|key| match key {
        "SECRET_KEY" => Some("integration-test-secret-key-0123456789abcdef".to_string()),
        "UPLOAD_FOLDER" => Some(upload_folder.clone()),
        "MAX_CONTENT_LENGTH" => Some(MAX_UPLOAD.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap();

    // One connection keeps the in-memory database alive and shared
    let pool = db::connect("sqlite::memory:", 1).await.unwrap();
    db::init(&pool).await.unwrap();
    let storage = Storage::from_config(&config).await.unwrap();

    TestEnv {
        pool,
        config,
        storage,
        uploads,
    }
}

macro_rules! init_app {
    ($env:expr) => {
        actix_web::test::init_service(actix_web::App::new().configure(
            tracker_backend::configure_app(
                $env.pool.clone(),
                $env.config.clone(),
                $env.storage.clone(),
            ),
        ))
        .await
    };
}

/// Sends a request and returns the status with the JSON body (`Null` when
/// the body is empty or not JSON).
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        let json: serde_json::Value =
            serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }};
}

macro_rules! login {
    ($app:expr, $username:expr, $password:expr) => {{
        let resp = actix_web::test::call_service(
            &$app,
            actix_web::test::TestRequest::post()
                .uri("/auth/login")
                .set_json(serde_json::json!({"username": $username, "password": $password}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        resp.response()
            .cookies()
            .find(|c| c.name() == tracker_backend::auth::SESSION_COOKIE)
            .expect("login sets the session cookie")
            .into_owned()
    }};
}

/// Registers and logs in a user; yields `(cookie, user_id)`.
macro_rules! signup {
    ($app:expr, $username:expr) => {{
        let (status, body) = call!(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/auth/register")
                .set_json(serde_json::json!({
                    "username": $username,
                    "email": format!("{}@example.com", $username),
                    "password": common::PASSWORD,
                }))
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED, "{}", body);
        let user_id = body["user"]["id"].as_i64().unwrap();
        (login!($app, $username, common::PASSWORD), user_id)
    }};
}

/// Creates a project as the given user and returns its JSON.
macro_rules! create_project {
    ($app:expr, $cookie:expr, $name:expr) => {{
        let (status, body) = call!(
            $app,
            actix_web::test::TestRequest::post()
                .uri("/api/projects")
                .cookie($cookie.clone())
                .set_json(serde_json::json!({"name": $name}))
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED, "{}", body);
        body
    }};
}

macro_rules! create_task {
    ($app:expr, $cookie:expr, $project_id:expr, $body:expr) => {{
        let (status, body) = call!(
            $app,
            actix_web::test::TestRequest::post()
                .uri(&format!("/api/projects/{}/tasks", $project_id))
                .cookie($cookie.clone())
                .set_json($body)
        );
        assert_eq!(status, actix_web::http::StatusCode::CREATED, "{}", body);
        body
    }};
}
