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

use ebonite_core::{EboniteError, ImageId, ModelId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_images).post(create_image))
        .route("/:id", get(get_image).patch(update_image).delete(delete_image))
}

pub async fn list_images(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let model_id: ModelId = match dto::parse_query_id(&params, "model_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_model_by_id(model_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    }
    match services.meta().get_images(model_id).await {
        Ok(images) => (StatusCode::OK, Json(images)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn get_image(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let image_id: ImageId = match dto::parse_path_id(&id, "image") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_image_by_id(image_id).await {
        Ok(Some(image)) => (StatusCode::OK, Json(image)).into_response(),
        Ok(None) => errors::ebonite_error_to_response(EboniteError::NonExistingImage(image_id)),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

/// Build (register) an image for an existing model.
pub async fn create_image(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::ImageRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let model_id = match dto::required(body.model_id, "model_id") {
        Ok(v) => ModelId::new(v),
        Err(resp) => return resp,
    };
    let model = match services.meta().get_model_by_id(model_id).await {
        Ok(Some(model)) => model,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingModel(model_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match services.client().build_image(&body.name, &model).await {
        Ok(image) => (StatusCode::CREATED, Json(image)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn update_image(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let image_id: ImageId = match dto::parse_path_id(&id, "image") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::ImageRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let model_id = match dto::required(body.model_id, "model_id") {
        Ok(v) => ModelId::new(v),
        Err(resp) => return resp,
    };

    let mut image = match services.meta().get_image_by_id(image_id).await {
        Ok(Some(image)) => image,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingImage(image_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };
    image.name = body.name;
    image.model_id = Some(model_id);

    match services.meta().update_image(image).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn delete_image(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let image_id: ImageId = match dto::parse_path_id(&id, "image") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cascade = match dto::parse_cascade(&params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let image = match services.meta().get_image_by_id(image_id).await {
        Ok(Some(image)) => image,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingImage(image_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match services.client().delete_image(&image, cascade).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}
