use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::{ArtifactRef, Blobs};
use crate::dataset::DatasetType;
use crate::error::{EboniteError, EboniteResult};
use crate::id::{ModelId, TaskId};
use crate::model_object::{ModelObject, Requirement, WrapperMeta};

/// A trained model: metadata about the wrapped object plus a reference to its
/// persisted artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: Option<ModelId>,
    pub name: String,
    pub task_id: Option<TaskId>,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    pub wrapper: WrapperMeta,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    pub input_meta: DatasetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_meta: Option<DatasetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,

    /// Blobs produced by `Model::create` that have not been pushed yet.
    #[serde(skip)]
    unpersisted_artifacts: Option<Blobs>,
}

impl Model {
    /// Bare record with the given wrapper and input type and no artifacts.
    pub fn new(name: impl Into<String>, wrapper: WrapperMeta, input_meta: DatasetType) -> Self {
        Self {
            id: None,
            name: name.into(),
            task_id: None,
            author: super::current_author(),
            creation_date: Utc::now(),
            description: None,
            params: BTreeMap::new(),
            wrapper,
            requirements: Vec::new(),
            input_meta,
            output_meta: None,
            artifact: None,
            unpersisted_artifacts: None,
        }
    }

    /// Wrap an arbitrary model object together with a sample of its input.
    ///
    /// When `model_name` is `None` a name is generated from the object's type.
    /// The dumped artifacts stay on the returned (unbound) model until it is
    /// pushed to a repository.
    pub fn create(
        model_object: &dyn ModelObject,
        input_data: &Value,
        model_name: Option<&str>,
        params: Option<BTreeMap<String, Value>>,
        description: Option<&str>,
    ) -> EboniteResult<Self> {
        let wrapper = model_object.wrapper_meta();
        let name = match model_name {
            Some(n) if n.trim().is_empty() => {
                return Err(EboniteError::validation("model name must not be empty"));
            }
            Some(n) => n.to_string(),
            None => generate_name(&wrapper.type_name),
        };

        let artifacts = model_object.dump()?;

        let mut model = Self::new(name, wrapper, DatasetType::analyze(input_data));
        model.output_meta = model_object.output_type(input_data);
        model.requirements = model_object.requirements();
        model.params = params.unwrap_or_default();
        model.description = description.map(str::to_string);
        model.unpersisted_artifacts = Some(artifacts);

        tracing::debug!(model = %model.name, "created model from object");
        Ok(model)
    }

    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn has_unpersisted_artifacts(&self) -> bool {
        self.unpersisted_artifacts.is_some()
    }

    /// Hand over the pending blobs (leaves none behind).
    pub fn take_unpersisted_artifacts(&mut self) -> Option<Blobs> {
        self.unpersisted_artifacts.take()
    }
}

fn generate_name(type_name: &str) -> String {
    let short = type_name.rsplit("::").next().unwrap_or(type_name);
    let suffix = uuid::Uuid::now_v7().simple().to_string();
    format!("{}_model_{}", short, &suffix[suffix.len() - 8..])
}

super::impl_entity!(Model, ModelId, "Model", parent: task_id: TaskId);
