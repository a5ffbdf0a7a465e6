use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

pub const CREATE_PROJECT: &str = "create_project";
pub const EDIT_PROJECT: &str = "edit_project";
pub const DELETE_PROJECT: &str = "delete_project";
pub const MANAGE_MEMBERS: &str = "manage_members";
pub const CREATE_TASK: &str = "create_task";
pub const EDIT_TASK: &str = "edit_task";
pub const DELETE_TASK: &str = "delete_task";
pub const ASSIGN_TASK: &str = "assign_task";
pub const VIEW_ALL_PROJECTS: &str = "view_all_projects";
pub const ADMIN_USERS: &str = "admin_users";

pub const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    (CREATE_PROJECT, "Create new projects"),
    (EDIT_PROJECT, "Edit project details"),
    (DELETE_PROJECT, "Delete projects"),
    (MANAGE_MEMBERS, "Manage project members"),
    (CREATE_TASK, "Create tasks"),
    (EDIT_TASK, "Edit tasks"),
    (DELETE_TASK, "Delete tasks"),
    (ASSIGN_TASK, "Assign tasks to users"),
    (VIEW_ALL_PROJECTS, "View all projects"),
    (ADMIN_USERS, "Manage users and groups"),
];

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Effective capabilities of one user, resolved through group membership.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PermissionSet {
    is_admin: bool,
    names: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new(is_admin: bool, names: impl IntoIterator<Item = String>) -> Self {
        PermissionSet {
            is_admin,
            names: names.into_iter().collect(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.is_admin || self.names.contains(name)
    }

    pub fn names(&self) -> Vec<String> {
        if self.is_admin {
            return DEFAULT_PERMISSIONS
                .iter()
                .map(|(name, _)| name.to_string())
                .chain(self.names.iter().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
        }
        self.names.iter().cloned().collect()
    }

    pub async fn load<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
        is_admin: bool,
    ) -> Result<PermissionSet, sqlx::Error> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT p.name FROM permissions p
             JOIN group_permissions gp ON gp.permission_id = p.id
             JOIN user_groups ug ON ug.group_id = gp.group_id
             WHERE ug.user_id = ?",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(PermissionSet::new(is_admin, names))
    }
}

impl Permission {
    pub async fn list_for_group<'e, E: SqliteExecutor<'e>>(
        executor: E,
        group_id: i64,
    ) -> Result<Vec<Permission>, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            "SELECT p.* FROM permissions p
             JOIN group_permissions gp ON gp.permission_id = p.id
             WHERE gp.group_id = ?
             ORDER BY p.name",
        )
        .bind(group_id)
        .fetch_all(executor)
        .await
    }
}
