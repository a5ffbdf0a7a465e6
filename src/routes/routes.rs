use actix_web::{web, HttpResponse};

use super::admin::admin_handlers;

pub fn admin_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/sessions/reset", web::post().to(admin_handlers::session_reset))
    );
}

use super::login::login_handlers;

pub fn auth_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/check-username", web::post().to(login_handlers::check_username))
            .route("/check-email", web::post().to(login_handlers::check_email))
            .route("/register", web::post().to(login_handlers::register))
            .route("/login", web::post().to(login_handlers::login))
            .route("/logout", web::post().to(login_handlers::logout))
            .route("/me", web::get().to(login_handlers::me))
    );
}

use super::dashboard::dashboard_handlers;
use super::dependencies::dependency_handlers;
use super::epics::epic_handlers;
use super::files::file_handlers;
use super::groups::group_handlers;
use super::labels::label_handlers;
use super::milestones::milestone_handlers;
use super::projects::project_handlers;
use super::releases::release_handlers;
use super::tasks::task_handlers;
use super::users::user_handlers;

pub fn api_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // projects
            .route("/projects", web::get().to(project_handlers::list_projects))
            .route("/projects", web::post().to(project_handlers::create_project))
            .route("/projects/{id}", web::get().to(project_handlers::get_project))
            .route("/projects/{id}", web::put().to(project_handlers::update_project))
            .route("/projects/{id}", web::delete().to(project_handlers::delete_project))
            .route("/projects/{id}/members", web::get().to(project_handlers::list_members))
            .route("/projects/{id}/members", web::post().to(project_handlers::add_member))
            .route("/projects/{id}/members/{user_id}", web::delete().to(project_handlers::remove_member))
            // tasks
            .route("/projects/{id}/tasks", web::get().to(task_handlers::list_tasks))
            .route("/projects/{id}/tasks", web::post().to(task_handlers::create_task))
            .route("/tasks/{id}", web::get().to(task_handlers::get_task))
            .route("/tasks/{id}", web::put().to(task_handlers::update_task))
            .route("/tasks/{id}", web::delete().to(task_handlers::delete_task))
            // epics
            .route("/epics/{id}/tasks", web::get().to(epic_handlers::list_epic_tasks))
            .route("/epics/{id}/tasks/{task_id}", web::post().to(epic_handlers::add_epic_task))
            .route("/epics/{id}/tasks/{task_id}", web::delete().to(epic_handlers::remove_epic_task))
            .route("/epics/{id}/progress", web::post().to(epic_handlers::refresh_epic_progress))
            // dependencies
            .route("/tasks/{id}/dependencies", web::get().to(dependency_handlers::list_dependencies))
            .route("/tasks/{id}/dependencies", web::post().to(dependency_handlers::add_dependency))
            .route("/tasks/{id}/dependencies/{predecessor_id}", web::delete().to(dependency_handlers::remove_dependency))
            // labels
            .route("/labels", web::get().to(label_handlers::list_labels))
            .route("/labels", web::post().to(label_handlers::create_label))
            .route("/tasks/{id}/labels", web::get().to(label_handlers::list_task_labels))
            .route("/tasks/{id}/labels/{label_id}", web::post().to(label_handlers::add_task_label))
            .route("/tasks/{id}/labels/{label_id}", web::delete().to(label_handlers::remove_task_label))
            // milestones
            .route("/projects/{id}/milestones", web::get().to(milestone_handlers::list_milestones))
            .route("/projects/{id}/milestones", web::post().to(milestone_handlers::create_milestone))
            .route("/milestones/{id}", web::put().to(milestone_handlers::update_milestone))
            .route("/milestones/{id}", web::delete().to(milestone_handlers::delete_milestone))
            .route("/milestones/{id}/tasks", web::get().to(milestone_handlers::list_milestone_tasks))
            .route("/milestones/{id}/tasks/{task_id}", web::post().to(milestone_handlers::add_milestone_task))
            .route("/milestones/{id}/tasks/{task_id}", web::delete().to(milestone_handlers::remove_milestone_task))
            // releases
            .route("/projects/{id}/releases", web::get().to(release_handlers::list_releases))
            .route("/projects/{id}/releases", web::post().to(release_handlers::create_release))
            .route("/releases/{id}", web::put().to(release_handlers::update_release))
            .route("/releases/{id}", web::delete().to(release_handlers::delete_release))
            // files
            .route("/tasks/{id}/files", web::get().to(file_handlers::list_files))
            .route("/tasks/{id}/files", web::post().to(file_handlers::upload_file))
            .route("/files/{id}", web::get().to(file_handlers::download_file))
            .route("/files/{id}", web::delete().to(file_handlers::delete_file))
            // users and groups
            .route("/users", web::get().to(user_handlers::list_users))
            .route("/users/{id}", web::get().to(user_handlers::get_user))
            .route("/users/{id}", web::put().to(user_handlers::update_user))
            .route("/users/{id}/groups/{group_id}", web::post().to(user_handlers::add_user_to_group))
            .route("/users/{id}/groups/{group_id}", web::delete().to(user_handlers::remove_user_from_group))
            .route("/groups", web::get().to(group_handlers::list_groups))
            .route("/dashboard", web::get().to(dashboard_handlers::dashboard))
    );
}

pub fn health_configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(|| async { HttpResponse::Ok().body("Project tracker is running") }));
}

/// Every route the application serves.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health_configure)
        .configure(auth_configure)
        .configure(api_configure)
        .configure(admin_configure);
}
