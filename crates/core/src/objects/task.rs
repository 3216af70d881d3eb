use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ProjectId, TaskId};

/// A problem within a project; groups the models that solve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<TaskId>,
    pub name: String,
    pub project_id: Option<ProjectId>,
    pub author: String,
    pub creation_date: DateTime<Utc>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            project_id: None,
            author: super::current_author(),
            creation_date: Utc::now(),
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

super::impl_entity!(Task, TaskId, "Task", parent: project_id: ProjectId);
