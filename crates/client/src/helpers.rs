//! Free-standing helpers that do not need a repository.

use std::collections::BTreeMap;

use serde_json::Value;

use ebonite_core::{EboniteResult, Model, ModelObject};

/// Create an unbound `Model` from `model_object` and a sample of its input.
///
/// The result still carries its dumped artifacts; push it with
/// `Ebonite::push_model` to persist them.
pub fn create_model(
    model_object: &dyn ModelObject,
    input_data: &Value,
    model_name: Option<&str>,
    params: Option<BTreeMap<String, Value>>,
    description: Option<&str>,
) -> EboniteResult<Model> {
    Model::create(model_object, input_data, model_name, params, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebonite_core::{Blob, Blobs, DatasetType, PrimitiveKind};
    use serde_json::json;

    struct Echo;

    impl ModelObject for Echo {
        fn type_name(&self) -> String {
            "demo::Echo".to_string()
        }

        fn dump(&self) -> EboniteResult<Blobs> {
            Ok(Blobs::from([("echo.bin".to_string(), Blob::in_memory(vec![1, 2, 3]))]))
        }
    }

    #[test]
    fn helper_builds_unbound_model_with_pending_artifacts() {
        let mut params = BTreeMap::new();
        params.insert("alpha".to_string(), json!(0.1));

        let model = create_model(&Echo, &json!("hello"), None, Some(params), Some("echoes")).unwrap();

        assert!(model.id.is_none());
        assert!(model.name.starts_with("Echo_model_"));
        assert_eq!(model.description.as_deref(), Some("echoes"));
        assert_eq!(model.params["alpha"], json!(0.1));
        assert_eq!(model.input_meta, DatasetType::primitive(PrimitiveKind::Str));
        assert!(model.has_unpersisted_artifacts());
    }
}
