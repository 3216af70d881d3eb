use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ImageId, InstanceId};

/// A running copy of an image, recorded for bookkeeping only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeInstance {
    pub id: Option<InstanceId>,
    pub name: String,
    pub image_id: Option<ImageId>,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl RuntimeInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            image_id: None,
            author: super::current_author(),
            creation_date: Utc::now(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_image(mut self, image_id: ImageId) -> Self {
        self.image_id = Some(image_id);
        self
    }
}

super::impl_entity!(RuntimeInstance, InstanceId, "Instance", parent: image_id: ImageId);
