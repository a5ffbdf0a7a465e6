use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReleaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Ready,
    Released,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Release {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub version: Option<String>,
    pub tag: Option<String>,
    pub status: ReleaseStatus,
    pub released_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct NewRelease {
    pub name: String,
    pub version: Option<String>,
    pub tag: Option<String>,
    pub status: ReleaseStatus,
    pub description: Option<String>,
    pub repo_url: Option<String>,
}

impl Release {
    /// `released_at` marks the moment the release last shipped.
    pub fn set_status(&mut self, status: ReleaseStatus, now: DateTime<Utc>) {
        self.released_at = match status {
            ReleaseStatus::Released if self.status == ReleaseStatus::Released => {
                self.released_at.or(Some(now))
            }
            ReleaseStatus::Released => Some(now),
            _ => None,
        };
        self.status = status;
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Release>, sqlx::Error> {
        sqlx::query_as::<_, Release>("SELECT * FROM releases WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_project<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<Release>, sqlx::Error> {
        sqlx::query_as::<_, Release>(
            "SELECT * FROM releases WHERE project_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
        release: &NewRelease,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let released_at = (release.status == ReleaseStatus::Released).then_some(now);
        let result = sqlx::query(
            "INSERT INTO releases (project_id, name, version, tag, status, released_at, description,
                                   repo_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(&release.name)
        .bind(&release.version)
        .bind(&release.tag)
        .bind(release.status)
        .bind(released_at)
        .bind(&release.description)
        .bind(&release.repo_url)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn save<'e, E: SqliteExecutor<'e>>(&self, executor: E) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE releases SET name = ?, version = ?, tag = ?, status = ?, released_at = ?,
                                 description = ?, repo_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&self.name)
        .bind(&self.version)
        .bind(&self.tag)
        .bind(self.status)
        .bind(self.released_at)
        .bind(&self.description)
        .bind(&self.repo_url)
        .bind(Utc::now())
        .bind(self.id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM releases WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
