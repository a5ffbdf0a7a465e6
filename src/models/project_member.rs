use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProjectRole {
    Viewer,
    #[default]
    Member,
    Admin,
    Owner,
}

impl ProjectRole {
    pub fn rank(self) -> u8 {
        match self {
            ProjectRole::Viewer => 1,
            ProjectRole::Member => 2,
            ProjectRole::Admin => 3,
            ProjectRole::Owner => 4,
        }
    }

    pub fn satisfies(self, required: ProjectRole) -> bool {
        self.rank() >= required.rank()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Membership row joined with the member's public user fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberDetail {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProjectMember {
    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
        user_id: i64,
    ) -> Result<Option<ProjectMember>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            "SELECT * FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list_detailed<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<MemberDetail>, sqlx::Error> {
        sqlx::query_as::<_, MemberDetail>(
            "SELECT pm.id, pm.project_id, pm.user_id, pm.role, pm.joined_at,
                    u.username, u.email, u.first_name, u.last_name
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = ?
             ORDER BY pm.joined_at, pm.id",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
        user_id: i64,
        role: ProjectRole,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_members WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn count_owners<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE project_id = ? AND role = ?")
            .bind(project_id)
            .bind(ProjectRole::Owner)
            .fetch_one(executor)
            .await
    }
}
