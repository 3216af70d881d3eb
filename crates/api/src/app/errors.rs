use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ebonite_core::EboniteError;

/// Missing records are 404, storage failures 500, everything else is a
/// client error (name clashes, remaining dependents, invalid input).
pub fn ebonite_error_to_response(err: EboniteError) -> axum::response::Response {
    let status = match &err {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        EboniteError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "errormsg": message.into(),
        })),
    )
        .into_response()
}
