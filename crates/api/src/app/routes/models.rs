use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use ebonite_core::{EboniteError, ModelId, TaskId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Models are created by pushing them through the client; the HTTP surface
/// only lists, renames/moves and deletes them.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_models))
        .route("/:id", get(get_model).patch(update_model).delete(delete_model))
        .route("/:id/artifacts/:name", get(get_model_artifact))
}

pub async fn list_models(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let task_id: TaskId = match dto::parse_query_id(&params, "task_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_task_by_id(task_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingTask(task_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    }
    match services.meta().get_models(task_id).await {
        Ok(models) => (StatusCode::OK, Json(models)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn get_model(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let model_id: ModelId = match dto::parse_path_id(&id, "model") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_model_by_id(model_id).await {
        Ok(Some(model)) => (StatusCode::OK, Json(model)).into_response(),
        Ok(None) => errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn update_model(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let model_id: ModelId = match dto::parse_path_id(&id, "model") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::ModelRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let task_id = match dto::required(body.task_id, "task_id") {
        Ok(v) => TaskId::new(v),
        Err(resp) => return resp,
    };

    let mut model = match services.meta().get_model_by_id(model_id).await {
        Ok(Some(model)) => model,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };
    model.name = body.name;
    model.task_id = Some(task_id);

    match services.meta().update_model(model).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn delete_model(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let model_id: ModelId = match dto::parse_path_id(&id, "model") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cascade = match dto::parse_cascade(&params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let model = match services.meta().get_model_by_id(model_id).await {
        Ok(Some(model)) => model,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match services.client().delete_model(&model, cascade).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

/// Descriptor of one artifact blob; payload bytes are not streamed.
pub async fn get_model_artifact(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, name)): Path<(String, String)>,
) -> axum::response::Response {
    let model_id: ModelId = match dto::parse_path_id(&id, "model") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let model = match services.meta().get_model_by_id(model_id).await {
        Ok(Some(model)) => model,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };
    let blobs = match services.client().get_model_artifacts(&model).await {
        Ok(blobs) => blobs,
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match blobs.get(&name) {
        Some(blob) => (StatusCode::OK, Json(blob.describe())).into_response(),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            format!("Artifact {name} does not exist for model with id {model_id}"),
        ),
    }
}
