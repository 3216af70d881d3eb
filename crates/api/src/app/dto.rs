use std::collections::HashMap;
use std::str::FromStr;

use axum::body::Bytes;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub name: String,
    pub project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub name: String,
    pub task_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub name: String,
    pub model_id: Option<i64>,
}

// -------------------------
// Parsing helpers
// -------------------------

/// Parse a JSON body whatever the request's `Content-Type` says.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, axum::response::Response> {
    serde_json::from_slice(body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, format!("invalid request body: {e}"))
    })
}

/// A field the request body must carry.
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, axum::response::Response> {
    value.ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, format!("{field} is required")))
}

pub fn parse_path_id<I: FromStr>(raw: &str, kind: &str) -> Result<I, axum::response::Response> {
    raw.trim()
        .parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, format!("invalid {kind} id '{raw}'")))
}

/// Required integer id from the query string (`?model_id=3`).
pub fn parse_query_id<I: FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<I, axum::response::Response> {
    let raw = required(params.get(key), key)?;
    raw.trim()
        .parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, format!("invalid {key} '{raw}'")))
}

/// `?cascade=<int>`: absent, empty or `0` is false, any other integer is true.
pub fn parse_cascade(params: &HashMap<String, String>) -> Result<bool, axum::response::Response> {
    match params.get("cascade") {
        None => Ok(false),
        Some(raw) if raw.trim().is_empty() => Ok(false),
        Some(raw) => raw.trim().parse::<i64>().map(|v| v != 0).map_err(|_| {
            errors::json_error(StatusCode::BAD_REQUEST, format!("cascade must be an integer, got '{raw}'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebonite_core::ModelId;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn cascade_follows_integer_truthiness() {
        assert!(!parse_cascade(&params(&[])).unwrap());
        assert!(!parse_cascade(&params(&[("cascade", "")])).unwrap());
        assert!(!parse_cascade(&params(&[("cascade", "0")])).unwrap());
        assert!(parse_cascade(&params(&[("cascade", "1")])).unwrap());
        assert!(parse_cascade(&params(&[("cascade", "-2")])).unwrap());
        assert_eq!(
            parse_cascade(&params(&[("cascade", "yes")])).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn query_ids_must_be_present_and_numeric() {
        let id: ModelId = parse_query_id(&params(&[("model_id", " 4 ")]), "model_id").unwrap();
        assert_eq!(id, ModelId::new(4));

        let missing = parse_query_id::<ModelId>(&params(&[]), "model_id").unwrap_err();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let garbage = parse_query_id::<ModelId>(&params(&[("model_id", "abc")]), "model_id").unwrap_err();
        assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn body_is_parsed_without_content_type() {
        let body = Bytes::from_static(br#"{"name": "img", "model_id": 2}"#);
        let req: ImageRequest = parse_body(&body).unwrap();
        assert_eq!(req.name, "img");
        assert_eq!(req.model_id, Some(2));

        let err = parse_body::<ImageRequest>(&Bytes::from_static(b"not json")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
