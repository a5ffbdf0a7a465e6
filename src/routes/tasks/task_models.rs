use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::project::Priority;
use crate::models::task::{NewTask, Severity, Task, TaskFilter, TaskStatus, TaskType};
use crate::routes::patch;

#[derive(Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    pub assignee_id: Option<i64>,
}

impl From<TaskQuery> for TaskFilter {
    fn from(query: TaskQuery) -> Self {
        TaskFilter {
            status: query.status,
            task_type: query.task_type,
            assignee_id: query.assignee_id,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
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

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
    pub progress_percentage: Option<i64>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub actual_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub assignee_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub epic_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub milestone_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub story_points: Option<Option<i64>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub acceptance_criteria: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub severity: Option<Option<Severity>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub environment: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub steps_to_reproduce: Option<Option<String>>,
}

/// Task as returned by the API, with its derived fields.
#[derive(Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub task_key: String,
    pub project_key: String,
    pub is_completed: bool,
    pub is_overdue: bool,
}

impl TaskDetail {
    pub fn new(task: Task, today: NaiveDate) -> Self {
        TaskDetail {
            task_key: task.task_key(),
            project_key: task.project_key.clone(),
            is_completed: task.is_completed(),
            is_overdue: task.is_overdue(today),
            task,
        }
    }

    pub fn list(tasks: Vec<Task>) -> Vec<TaskDetail> {
        let today = Utc::now().date_naive();
        tasks.into_iter().map(|t| TaskDetail::new(t, today)).collect()
    }
}

#[derive(Serialize)]
pub struct TaskDeleteResponse {
    pub success: bool,
    pub message: String,
}

pub fn validate_title(title: &str) -> ApiResult<()> {
    let len = title.trim().chars().count();
    if len == 0 || len > 255 {
        return Err(ApiError::BadRequest("title must be between 1 and 255 characters".into()));
    }
    Ok(())
}

fn validate_hours(field: &str, hours: Option<f64>) -> ApiResult<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => {
            Err(ApiError::BadRequest(format!("{} must not be negative", field)))
        }
        _ => Ok(()),
    }
}

fn validate_story_points(points: Option<i64>) -> ApiResult<()> {
    match points {
        Some(p) if p < 0 => Err(ApiError::BadRequest("story_points must not be negative".into())),
        _ => Ok(()),
    }
}

impl CreateTaskRequest {
    pub fn into_new_task(self, project_id: i64) -> ApiResult<NewTask> {
        validate_title(&self.title)?;
        validate_hours("estimated_hours", self.estimated_hours)?;
        validate_story_points(self.story_points)?;
        Ok(NewTask {
            project_id,
            title: self.title.trim().to_string(),
            description: self.description,
            status: self.status,
            priority: self.priority,
            task_type: self.task_type,
            due_date: self.due_date,
            estimated_hours: self.estimated_hours,
            assignee_id: self.assignee_id,
            epic_id: self.epic_id,
            milestone_id: self.milestone_id,
            story_points: self.story_points,
            acceptance_criteria: self.acceptance_criteria,
            severity: self.severity,
            environment: self.environment,
            steps_to_reproduce: self.steps_to_reproduce,
        })
    }
}

impl UpdateTaskRequest {
    /// Applies the supplied fields. Progress follows the status only when
    /// the request changes status without naming a progress value.
    pub fn apply_to(self, task: &mut Task, now: DateTime<Utc>) -> ApiResult<()> {
        if let Some(title) = self.title {
            validate_title(&title)?;
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(task_type) = self.task_type {
            task.task_type = task_type;
        }

        match (self.status, self.progress_percentage) {
            (_, Some(progress)) => {
                if !(0..=100).contains(&progress) {
                    return Err(ApiError::BadRequest(
                        "progress_percentage must be between 0 and 100".into(),
                    ));
                }
                if let Some(status) = self.status {
                    task.status = status;
                }
                task.progress_percentage = progress;
            }
            (Some(status), None) => {
                task.status = status;
                task.progress_percentage = status.default_progress();
            }
            (None, None) => {}
        }
        task.sync_completion(now);

        validate_hours("estimated_hours", self.estimated_hours.flatten())?;
        validate_hours("actual_hours", self.actual_hours.flatten())?;
        validate_story_points(self.story_points.flatten())?;

        patch::apply(&mut task.due_date, self.due_date);
        patch::apply(&mut task.estimated_hours, self.estimated_hours);
        patch::apply(&mut task.actual_hours, self.actual_hours);
        patch::apply(&mut task.assignee_id, self.assignee_id);
        patch::apply(&mut task.epic_id, self.epic_id);
        patch::apply(&mut task.milestone_id, self.milestone_id);
        patch::apply(&mut task.story_points, self.story_points);
        patch::apply(&mut task.acceptance_criteria, self.acceptance_criteria);
        patch::apply(&mut task.severity, self.severity);
        patch::apply(&mut task.environment, self.environment);
        patch::apply(&mut task.steps_to_reproduce, self.steps_to_reproduce);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            id: 3,
            project_id: 1,
            task_number: 3,
            title: "Fix login".into(),
            description: "Cookie is not set".into(),
            status: TaskStatus::Todo,
            priority: Priority::High,
            task_type: TaskType::Bug,
            due_date: NaiveDate::from_ymd_opt(2024, 9, 1),
            completed_at: None,
            estimated_hours: Some(3.0),
            actual_hours: None,
            progress_percentage: 25,
            assignee_id: Some(2),
            epic_id: None,
            milestone_id: None,
            story_points: None,
            acceptance_criteria: None,
            severity: Some(Severity::High),
            environment: Some("staging".into()),
            steps_to_reproduce: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            project_key: "WEBS-001".into(),
            is_blocked: false,
        }
    }

    fn update(json: &str) -> UpdateTaskRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn only_supplied_fields_change() {
        let mut t = task();
        update(r#"{"title": "Fix login cookie"}"#)
            .apply_to(&mut t, Utc::now())
            .unwrap();
        assert_eq!(t.title, "Fix login cookie");
        assert_eq!(t.description, "Cookie is not set");
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.assignee_id, Some(2));
        assert_eq!(t.severity, Some(Severity::High));
    }

    #[test]
    fn status_change_moves_progress_and_completion() {
        let now = Utc::now();
        let mut t = task();
        update(r#"{"status": "done"}"#).apply_to(&mut t, now).unwrap();
        assert_eq!(t.progress_percentage, 100);
        assert_eq!(t.completed_at, Some(now));

        update(r#"{"status": "doing"}"#).apply_to(&mut t, now).unwrap();
        assert_eq!(t.progress_percentage, 50);
        assert_eq!(t.completed_at, None);
    }

    #[test]
    fn explicit_progress_wins_over_status() {
        let mut t = task();
        update(r#"{"status": "doing", "progress_percentage": 80}"#)
            .apply_to(&mut t, Utc::now())
            .unwrap();
        assert_eq!(t.status, TaskStatus::Doing);
        assert_eq!(t.progress_percentage, 80);
    }

    #[test]
    fn progress_out_of_range_is_rejected() {
        let mut t = task();
        assert!(update(r#"{"progress_percentage": 101}"#)
            .apply_to(&mut t, Utc::now())
            .is_err());
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let mut t = task();
        update(r#"{"assignee_id": null, "due_date": null}"#)
            .apply_to(&mut t, Utc::now())
            .unwrap();
        assert_eq!(t.assignee_id, None);
        assert_eq!(t.due_date, None);
        assert_eq!(t.estimated_hours, Some(3.0));
    }

    #[test]
    fn type_query_parameter_maps_to_filter() {
        let query: TaskQuery = serde_json::from_str(r#"{"type": "bug", "status": "todo"}"#).unwrap();
        let filter = TaskFilter::from(query);
        assert_eq!(filter.task_type, Some(TaskType::Bug));
        assert_eq!(filter.status, Some(TaskStatus::Todo));
        assert_eq!(filter.assignee_id, None);
    }

    #[test]
    fn create_rejects_blank_titles() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"title": "  "}"#).unwrap();
        assert!(request.into_new_task(1).is_err());
    }
}
