use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::id::ProjectId;

/// Top-level grouping of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<ProjectId>,
    pub name: String,
    pub author: String,
    pub creation_date: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            author: super::current_author(),
            creation_date: Utc::now(),
        }
    }
}

impl Entity for Project {
    type Id = ProjectId;
    type ParentId = ();
    const KIND: &'static str = "Project";

    fn id(&self) -> Option<Self::Id> {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = Some(id);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<Self::ParentId> {
        Some(())
    }
}
