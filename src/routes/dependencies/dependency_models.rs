use serde::{Deserialize, Serialize};

use crate::models::task::Task;
use crate::routes::tasks::task_models::TaskDetail;

#[derive(Deserialize)]
pub struct AddDependencyRequest {
    pub predecessor_id: i64,
}

/// Both sides of a task's dependency edges.
#[derive(Serialize)]
pub struct DependencyView {
    pub task_id: i64,
    pub is_blocked: bool,
    pub predecessors: Vec<TaskDetail>,
    pub successors: Vec<TaskDetail>,
}

impl DependencyView {
    pub fn new(task_id: i64, predecessors: Vec<Task>, successors: Vec<Task>) -> Self {
        DependencyView {
            task_id,
            is_blocked: predecessors.iter().any(|t| !t.is_completed()),
            predecessors: TaskDetail::list(predecessors),
            successors: TaskDetail::list(successors),
        }
    }
}
