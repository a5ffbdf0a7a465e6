use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};
use crate::models::milestone::{Milestone, MilestoneStatus, MilestoneSummary};
use crate::routes::patch;

#[derive(Deserialize)]
pub struct CreateMilestoneRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct UpdateMilestoneRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<MilestoneStatus>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub target_date: Option<Option<NaiveDate>>,
}

#[derive(Serialize)]
pub struct MilestoneDetail {
    #[serde(flatten)]
    pub summary: MilestoneSummary,
    pub progress_percentage: i64,
    pub is_overdue: bool,
}

impl MilestoneDetail {
    pub fn new(summary: MilestoneSummary, today: NaiveDate) -> Self {
        let progress_percentage = if summary.task_count == 0 {
            0
        } else {
            summary.completed_task_count * 100 / summary.task_count
        };
        MilestoneDetail {
            is_overdue: summary.milestone.is_overdue(today),
            progress_percentage,
            summary,
        }
    }

    pub fn list(summaries: Vec<MilestoneSummary>) -> Vec<MilestoneDetail> {
        let today = Utc::now().date_naive();
        summaries
            .into_iter()
            .map(|s| MilestoneDetail::new(s, today))
            .collect()
    }
}

#[derive(Serialize)]
pub struct MilestoneDeleteResponse {
    pub success: bool,
    pub message: String,
}

pub fn validate_milestone_name(name: &str) -> ApiResult<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > 128 {
        return Err(ApiError::BadRequest("name must be between 1 and 128 characters".into()));
    }
    Ok(())
}

impl UpdateMilestoneRequest {
    pub fn apply_to(self, milestone: &mut Milestone, today: NaiveDate) -> ApiResult<()> {
        if let Some(name) = self.name {
            validate_milestone_name(&name)?;
            milestone.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(status) = self.status {
            milestone.set_status(status, today);
        }
        patch::apply(&mut milestone.target_date, self.target_date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone() -> Milestone {
        Milestone {
            id: 4,
            project_id: 1,
            name: "Beta".into(),
            description: String::new(),
            status: MilestoneStatus::Planned,
            target_date: NaiveDate::from_ymd_opt(2024, 10, 1),
            completed_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn progress_is_share_of_completed_tasks() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let detail = MilestoneDetail::new(
            MilestoneSummary {
                milestone: milestone(),
                task_count: 3,
                completed_task_count: 2,
            },
            today,
        );
        assert_eq!(detail.progress_percentage, 66);
        assert!(!detail.is_overdue);
    }

    #[test]
    fn manual_completion_records_the_date() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let mut m = milestone();
        let request: UpdateMilestoneRequest =
            serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        request.apply_to(&mut m, today).unwrap();
        assert_eq!(m.completed_date, Some(today));

        let request: UpdateMilestoneRequest =
            serde_json::from_str(r#"{"status": "in_progress", "target_date": null}"#).unwrap();
        request.apply_to(&mut m, today).unwrap();
        assert_eq!(m.completed_date, None);
        assert_eq!(m.target_date, None);
    }
}
