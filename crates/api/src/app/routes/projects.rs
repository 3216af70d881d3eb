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

use ebonite_core::{EboniteError, Project, ProjectId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", get(get_project).patch(update_project).delete(delete_project))
}

pub async fn list_projects(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.meta().get_projects().await {
        Ok(projects) => (StatusCode::OK, Json(projects)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let project_id: ProjectId = match dto::parse_path_id(&id, "project") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_project_by_id(project_id).await {
        Ok(Some(project)) => (StatusCode::OK, Json(project)).into_response(),
        Ok(None) => errors::ebonite_error_to_response(EboniteError::NonExistingProject(project_id)),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::ProjectRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().create_project(Project::new(body.name)).await {
        Ok(project) => (StatusCode::CREATED, Json(project)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let project_id: ProjectId = match dto::parse_path_id(&id, "project") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::ProjectRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut project = match services.meta().get_project_by_id(project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingProject(project_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };
    project.name = body.name;

    match services.meta().update_project(project).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let project_id: ProjectId = match dto::parse_path_id(&id, "project") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cascade = match dto::parse_cascade(&params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let project = match services.meta().get_project_by_id(project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingProject(project_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match services.client().delete_project(&project, cascade).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}
