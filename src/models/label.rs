use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Accepts `#RRGGBB` hex colours only.
pub fn valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl Label {
    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT * FROM labels WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_name<'e, E: SqliteExecutor<'e>>(
        executor: E,
        name: &str,
    ) -> Result<Option<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT * FROM labels WHERE name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<Vec<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT * FROM labels ORDER BY name")
            .fetch_all(executor)
            .await
    }

    pub async fn list_for_task<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            "SELECT l.* FROM labels l
             JOIN task_labels tl ON tl.label_id = l.id
             WHERE tl.task_id = ?
             ORDER BY l.name",
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        name: &str,
        color: Option<&str>,
        description: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO labels (name, color, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(color)
        .bind(description)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Returns false when the label was already on the task.
    pub async fn attach<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
        label_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT OR IGNORE INTO task_labels (task_id, label_id) VALUES (?, ?)")
            .bind(task_id)
            .bind(label_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns false when the label was not on the task.
    pub async fn detach<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
        label_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_labels WHERE task_id = ? AND label_id = ?")
            .bind(task_id)
            .bind(label_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
