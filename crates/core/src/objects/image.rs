use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ImageId, ModelId};

/// A deployable image built from a model. Only the metadata record is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: Option<ImageId>,
    pub name: String,
    pub model_id: Option<ModelId>,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Image {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            model_id: None,
            author: super::current_author(),
            creation_date: Utc::now(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, model_id: ModelId) -> Self {
        self.model_id = Some(model_id);
        self
    }
}

super::impl_entity!(Image, ImageId, "Image", parent: model_id: ModelId);
