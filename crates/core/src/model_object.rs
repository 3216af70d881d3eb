//! The seam through which arbitrary model objects enter the system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::Blobs;
use crate::dataset::DatasetType;
use crate::error::EboniteResult;

/// A package the model needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Requirement {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Description of the wrapped model object, stored on the model record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperMeta {
    pub type_name: String,
    pub methods: Vec<String>,
}

/// An in-process model object (a function, a fitted estimator, ...) that can
/// describe itself and serialize its state into blobs.
pub trait ModelObject {
    fn type_name(&self) -> String;

    /// Callable methods exposed by the model.
    fn methods(&self) -> Vec<String> {
        vec!["predict".to_string()]
    }

    fn requirements(&self) -> Vec<Requirement> {
        Vec::new()
    }

    /// Serialize the model state.
    fn dump(&self) -> EboniteResult<Blobs>;

    /// Output type for the given sample input, if the object can tell.
    fn output_type(&self, _input: &Value) -> Option<DatasetType> {
        None
    }

    fn wrapper_meta(&self) -> WrapperMeta {
        WrapperMeta {
            type_name: self.type_name(),
            methods: self.methods(),
        }
    }
}
