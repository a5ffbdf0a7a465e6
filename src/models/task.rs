use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{Sqlite, SqliteExecutor};
use sqlx::{FromRow, QueryBuilder};

use super::project::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    Doing,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Progress a task reports when nobody has set it by hand.
    pub fn default_progress(self) -> i64 {
        match self {
            TaskStatus::Backlog => 0,
            TaskStatus::Todo => 25,
            TaskStatus::Doing => 50,
            TaskStatus::Done => 100,
            TaskStatus::Cancelled => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Task,
    Story,
    Bug,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A task row plus the owning project's key, which every read joins in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub task_number: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub task_type: TaskType,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub progress_percentage: i64,
    pub assignee_id: Option<i64>,
    pub epic_id: Option<i64>,
    pub milestone_id: Option<i64>,
    pub story_points: Option<i64>,
    pub acceptance_criteria: Option<String>,
    pub severity: Option<Severity>,
    pub environment: Option<String>,
    pub steps_to_reproduce: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub project_key: String,
    /// Some predecessor is not done yet.
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub task_type: TaskType,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub assignee_id: Option<i64>,
    pub epic_id: Option<i64>,
    pub milestone_id: Option<i64>,
    pub story_points: Option<i64>,
    pub acceptance_criteria: Option<String>,
    pub severity: Option<Severity>,
    pub environment: Option<String>,
    pub steps_to_reproduce: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub assignee_id: Option<i64>,
}

const SELECT_TASK: &str = "SELECT t.*, p.key AS project_key,
        EXISTS (SELECT 1 FROM task_dependencies d JOIN tasks pre ON pre.id = d.predecessor_id
                WHERE d.successor_id = t.id AND pre.status <> 'done') AS is_blocked
     FROM tasks t JOIN projects p ON p.id = t.project_id";

impl Task {
    pub fn task_key(&self) -> String {
        format!("{}-{:03}", self.project_key, self.task_number)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.is_completed(),
            None => false,
        }
    }

    /// Keeps `completed_at` in step with `status`.
    pub fn sync_completion(&mut self, now: DateTime<Utc>) {
        if self.status == TaskStatus::Done {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
    }

    pub async fn find<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("{} WHERE t.id = ?", SELECT_TASK))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_for_project<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, sqlx::Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_TASK);
        query.push(" WHERE t.project_id = ").push_bind(project_id);
        if let Some(status) = filter.status {
            query.push(" AND t.status = ").push_bind(status);
        }
        if let Some(task_type) = filter.task_type {
            query.push(" AND t.task_type = ").push_bind(task_type);
        }
        if let Some(assignee_id) = filter.assignee_id {
            query.push(" AND t.assignee_id = ").push_bind(assignee_id);
        }
        query.push(" ORDER BY t.task_number");

        query.build_query_as::<Task>().fetch_all(executor).await
    }

    pub async fn list_for_epic<'e, E: SqliteExecutor<'e>>(
        executor: E,
        epic_id: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.epic_id = ? ORDER BY t.task_number",
            SELECT_TASK
        ))
        .bind(epic_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_for_milestone<'e, E: SqliteExecutor<'e>>(
        executor: E,
        milestone_id: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.milestone_id = ? ORDER BY t.task_number",
            SELECT_TASK
        ))
        .bind(milestone_id)
        .fetch_all(executor)
        .await
    }

    /// Tasks the given task depends on.
    pub async fn list_predecessors<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.id IN (SELECT predecessor_id FROM task_dependencies WHERE successor_id = ?)
             ORDER BY t.task_number",
            SELECT_TASK
        ))
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_successors<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_id: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.id IN (SELECT successor_id FROM task_dependencies WHERE predecessor_id = ?)
             ORDER BY t.task_number",
            SELECT_TASK
        ))
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Most recently updated tasks assigned to a user, limited to projects
    /// they belong to.
    pub async fn recent_for_assignee<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.assignee_id = ?
               AND t.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
             ORDER BY t.updated_at DESC, t.id DESC
             LIMIT ?",
            SELECT_TASK
        ))
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    /// Open tasks past their due date in any project the user belongs to.
    pub async fn overdue_for_member<'e, E: SqliteExecutor<'e>>(
        executor: E,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "{} WHERE t.due_date < ? AND t.status <> 'done'
               AND t.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
             ORDER BY t.due_date, t.id",
            SELECT_TASK
        ))
        .bind(today)
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn next_task_number<'e, E: SqliteExecutor<'e>>(
        executor: E,
        project_id: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(MAX(task_number), 0) + 1 FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(executor)
            .await
    }

    pub async fn insert<'e, E: SqliteExecutor<'e>>(
        executor: E,
        task_number: i64,
        new_task: &NewTask,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let completed_at = (new_task.status == TaskStatus::Done).then_some(now);
        let result = sqlx::query(
            "INSERT INTO tasks (project_id, task_number, title, description, status, priority, task_type,
                                due_date, completed_at, estimated_hours, progress_percentage, assignee_id,
                                epic_id, milestone_id, story_points, acceptance_criteria, severity,
                                environment, steps_to_reproduce, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_task.project_id)
        .bind(task_number)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.status)
        .bind(new_task.priority)
        .bind(new_task.task_type)
        .bind(new_task.due_date)
        .bind(completed_at)
        .bind(new_task.estimated_hours)
        .bind(new_task.status.default_progress())
        .bind(new_task.assignee_id)
        .bind(new_task.epic_id)
        .bind(new_task.milestone_id)
        .bind(new_task.story_points)
        .bind(&new_task.acceptance_criteria)
        .bind(new_task.severity)
        .bind(&new_task.environment)
        .bind(&new_task.steps_to_reproduce)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn save<'e, E: SqliteExecutor<'e>>(&self, executor: E) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, task_type = ?,
                              due_date = ?, completed_at = ?, estimated_hours = ?, actual_hours = ?,
                              progress_percentage = ?, assignee_id = ?, epic_id = ?, milestone_id = ?,
                              story_points = ?, acceptance_criteria = ?, severity = ?, environment = ?,
                              steps_to_reproduce = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.status)
        .bind(self.priority)
        .bind(self.task_type)
        .bind(self.due_date)
        .bind(self.completed_at)
        .bind(self.estimated_hours)
        .bind(self.actual_hours)
        .bind(self.progress_percentage)
        .bind(self.assignee_id)
        .bind(self.epic_id)
        .bind(self.milestone_id)
        .bind(self.story_points)
        .bind(&self.acceptance_criteria)
        .bind(self.severity)
        .bind(&self.environment)
        .bind(&self.steps_to_reproduce)
        .bind(Utc::now())
        .bind(self.id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Bumps `updated_at`; as the first statement of a transaction it takes
    /// the database write lock.
    pub async fn touch<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_epic<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
        epic_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET epic_id = ?, updated_at = ? WHERE id = ?")
            .bind(epic_id)
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_milestone<'e, E: SqliteExecutor<'e>>(
        executor: E,
        id: i64,
        milestone_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tasks SET milestone_id = ?, updated_at = ? WHERE id = ?")
            .bind(milestone_id)
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Sets an epic's progress to the rounded mean of its children. Epics
    /// without children keep whatever progress they had.
    pub async fn refresh_epic_progress<'e, E: SqliteExecutor<'e>>(
        executor: E,
        epic_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET
                progress_percentage = (SELECT CAST(ROUND(AVG(c.progress_percentage)) AS INTEGER)
                                       FROM tasks c WHERE c.epic_id = tasks.id),
                updated_at = ?
             WHERE id = ? AND EXISTS (SELECT 1 FROM tasks c WHERE c.epic_id = tasks.id)",
        )
        .bind(Utc::now())
        .bind(epic_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
