use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteExecutor;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Milestone {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub status: MilestoneStatus,
    pub target_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Milestone row with its task counters.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MilestoneSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub milestone: Milestone,
    pub task_count: i64,
    pub completed_task_count: i64,
}

/// Status implied by a milestone's tasks; `None` leaves it unchanged.
pub fn rollup_status(total: i64, done: i64) -> Option<MilestoneStatus> {
    if total == 0 {
        None
    } else if done == total {
        Some(MilestoneStatus::Completed)
    } else if done > 0 {
        Some(MilestoneStatus::InProgress)
    } else {
        Some(MilestoneStatus::Planned)
    }
}

const SELECT_SUMMARY: &str = "SELECT m.*,
        (SELECT COUNT(*) FROM tasks t WHERE t.milestone_id = m.id) AS task_count,
        (SELECT COUNT(*) FROM tasks t WHERE t.milestone_id = m.id AND t.status = 'done') AS completed_task_count
     FROM milestones m";

impl Milestone {
    pub fn is_completed(&self) -> bool {
        self.status == MilestoneStatus::Completed
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.target_date {
            Some(target) => target < today && !self.is_completed(),
            None => false,
        }
    }

    /// `completed_date` is the day the milestone last became completed; it
    /// is cleared whenever the milestone leaves that status.
    pub fn set_status(&mut self, status: MilestoneStatus, today: NaiveDate) {
        self.completed_date = match status {
            MilestoneStatus::Completed if self.is_completed() => self.completed_date.or(Some(today)),
            MilestoneStatus::Completed => Some(today),
            _ => None,
        };
        self.status = status;
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Milestone>, sqlx::Error> {
        sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_summary<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<MilestoneSummary>, sqlx::Error> {
        sqlx::query_as::<_, MilestoneSummary>(&format!("{} WHERE m.id = ?", SELECT_SUMMARY))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_project<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<Vec<MilestoneSummary>, sqlx::Error> {
        sqlx::query_as::<_, MilestoneSummary>(&format!(
            "{} WHERE m.project_id = ? ORDER BY m.target_date IS NULL, m.target_date, m.id",
            SELECT_SUMMARY
        ))
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
        name: &str,
        description: &str,
        target_date: Option<NaiveDate>,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO milestones (project_id, name, description, status, target_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(name)
        .bind(description)
        .bind(MilestoneStatus::Planned)
        .bind(target_date)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn save<'e, E: SqliteExecutor<'e>>(&self, executor: E) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE milestones SET name = ?, description = ?, status = ?, target_date = ?, completed_date = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.status)
        .bind(self.target_date)
        .bind(self.completed_date)
        .bind(Utc::now())
        .bind(self.id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM milestones WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Re-derives status from the milestone's tasks.
    pub async fn refresh_status(
        conn: &mut sqlx::SqliteConnection,
        id: i64,
    ) -> Result<(), sqlx::Error> {
        let Some(mut milestone) = Milestone::find(&mut *conn, id).await? else {
            return Ok(());
        };
        let (total, done): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0)
             FROM tasks WHERE milestone_id = ?",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        let Some(status) = rollup_status(total, done) else {
            return Ok(());
        };
        if status == milestone.status {
            return Ok(());
        }
        milestone.set_status(status, Utc::now().date_naive());
        milestone.save(&mut *conn).await
    }
}
