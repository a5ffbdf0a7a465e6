use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

use super::permission::{
    ADMIN_USERS, ASSIGN_TASK, CREATE_PROJECT, CREATE_TASK, DELETE_PROJECT, DELETE_TASK,
    EDIT_PROJECT, EDIT_TASK, MANAGE_MEMBERS, VIEW_ALL_PROJECTS,
};

/// Group every newly registered user joins.
pub const DEFAULT_USER_GROUP: &str = "users";

pub const DEFAULT_GROUPS: &[(&str, &str, &[&str])] = &[
    (
        DEFAULT_USER_GROUP,
        "Regular users",
        &[CREATE_PROJECT, CREATE_TASK, EDIT_TASK],
    ),
    (
        "project_managers",
        "Project managers",
        &[
            CREATE_PROJECT,
            EDIT_PROJECT,
            MANAGE_MEMBERS,
            CREATE_TASK,
            EDIT_TASK,
            DELETE_TASK,
            ASSIGN_TASK,
        ],
    ),
    (
        "admins",
        "System administrators",
        &[
            CREATE_PROJECT,
            EDIT_PROJECT,
            DELETE_PROJECT,
            MANAGE_MEMBERS,
            CREATE_TASK,
            EDIT_TASK,
            DELETE_TASK,
            ASSIGN_TASK,
            VIEW_ALL_PROJECTS,
            ADMIN_USERS,
        ],
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_name<'e, E: SqliteExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY name")
            .fetch_all(executor)
            .await
    }

    pub async fn list_for_user<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<Group>, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "SELECT g.* FROM groups g
             JOIN user_groups ug ON ug.group_id = g.id
             WHERE ug.user_id = ?
             ORDER BY g.name",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Returns false when the user already belonged to the group.
    pub async fn add_user<'e, E: SqliteExecutor<'e>>(
        executor: E,
        group_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_groups (user_id, group_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(group_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_user<'e, E: SqliteExecutor<'e>>(
        executor: E,
        group_id: i64,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_groups WHERE user_id = ? AND group_id = ?")
            .bind(user_id)
            .bind(group_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
