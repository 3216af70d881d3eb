use axum::Router;

pub mod images;
pub mod models;
pub mod projects;
pub mod system;
pub mod tasks;

/// Router for all entity endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
        .nest("/models", models::router())
        .nest("/images", images::router())
}
