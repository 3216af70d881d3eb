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

use ebonite_core::{EboniteError, ProjectId, Task, TaskId};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).patch(update_task).delete(delete_task))
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let project_id: ProjectId = match dto::parse_query_id(&params, "project_id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_project_by_id(project_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingProject(project_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    }
    match services.meta().get_tasks(project_id).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let task_id: TaskId = match dto::parse_path_id(&id, "task") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.meta().get_task_by_id(task_id).await {
        Ok(Some(task)) => (StatusCode::OK, Json(task)).into_response(),
        Ok(None) => errors::ebonite_error_to_response(EboniteError::NonExistingTask(task_id)),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let body: dto::TaskRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let project_id = match dto::required(body.project_id, "project_id") {
        Ok(v) => ProjectId::new(v),
        Err(resp) => return resp,
    };

    // Unknown project surfaces as NonExistingProject from the repository.
    match services
        .meta()
        .create_task(Task::new(body.name).with_project(project_id))
        .await
    {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let task_id: TaskId = match dto::parse_path_id(&id, "task") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body: dto::TaskRequest = match dto::parse_body(&body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let project_id = match dto::required(body.project_id, "project_id") {
        Ok(v) => ProjectId::new(v),
        Err(resp) => return resp,
    };

    let mut task = match services.meta().get_task_by_id(task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingTask(task_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };
    task.name = body.name;
    task.project_id = Some(project_id);

    match services.meta().update_task(task).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    let task_id: TaskId = match dto::parse_path_id(&id, "task") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cascade = match dto::parse_cascade(&params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let task = match services.meta().get_task_by_id(task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => return errors::ebonite_error_to_response(EboniteError::NonExistingTask(task_id)),
        Err(e) => return errors::ebonite_error_to_response(e),
    };

    match services.client().delete_task(&task, cascade).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ebonite_error_to_response(e),
    }
}
