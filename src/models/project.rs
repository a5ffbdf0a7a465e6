use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
    OnHold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub key: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewProject<'a> {
    pub name: &'a str,
    pub key: &'a str,
    pub description: &'a str,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub creator_id: i64,
}

/// Upper-cased alphanumeric prefix of a project name, three or four characters.
pub fn key_base(name: &str) -> String {
    let mut base: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while base.len() < 3 {
        base.push('X');
    }
    base
}

pub fn format_key(base: &str, counter: u32) -> String {
    format!("{}-{:03}", base, counter)
}

impl Project {
    pub async fn next_available_key<'e, E: SqliteExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<String, sqlx::Error> {
        let base = key_base(name);
        let taken: Vec<String> = sqlx::query_scalar("SELECT key FROM projects WHERE key LIKE ?")
            .bind(format!("{}-%", base))
            .fetch_all(executor)
            .await?;

        let mut counter = 1;
        loop {
            let key = format_key(&base, counter);
            if !taken.contains(&key) {
                return Ok(key);
            }
            counter += 1;
        }
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_member<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT p.* FROM projects p
             JOIN project_members pm ON pm.project_id = p.id
             WHERE pm.user_id = ?
             ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_all<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at DESC, id DESC")
            .fetch_all(executor)
            .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        new_project: &NewProject<'_>,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO projects (name, key, description, status, priority, start_date, end_date, creator_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_project.name)
        .bind(new_project.key)
        .bind(new_project.description)
        .bind(new_project.status)
        .bind(new_project.priority)
        .bind(new_project.start_date)
        .bind(new_project.end_date)
        .bind(new_project.creator_id)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn save<'e, E: SqliteExecutor<'e>>(&self, executor: E) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE projects SET name = ?, description = ?, status = ?, priority = ?, start_date = ?, end_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.status)
        .bind(self.priority)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(Utc::now())
        .bind(self.id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
