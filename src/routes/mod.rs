//! HTTP routes for HarvestLink

pub mod auth_routes;
pub mod crop_routes;
pub mod friend_routes;
pub mod health;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::Claims;
use crate::server::AppState;
use crate::types::HarvestError;

pub use auth_routes::handle_auth_request;
pub use crop_routes::{handle_add_crop, handle_crop_details, handle_list_crops};
pub use friend_routes::{
    handle_accept_request, handle_friend_profile, handle_friend_request, handle_friends_list,
    handle_list_requests, handle_list_users, handle_reject_request,
};
pub use health::health_check;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error envelope for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Success envelope for operations without a payload
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: error.into(),
            code: None,
        },
    )
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &MessageResponse {
            success: status.is_success(),
            message: message.into(),
        },
    )
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    error_response(StatusCode::NOT_FOUND, format!("Not found: {}", path))
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read and deserialize a JSON request body (capped at 10 KiB)
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, HarvestError> {
    let body = req
        .collect()
        .await
        .map_err(|e| HarvestError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(HarvestError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| HarvestError::Http(format!("Invalid JSON: {}", e)))
}

pub fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Verify the bearer token on a request, or produce the 401 response
pub fn require_auth(
    req: &Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<Claims, Response<BoxBody>> {
    let token = crate::auth::extract_token_from_header(get_auth_header(req)).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "Missing Authorization header")
    })?;

    let result = state.jwt.verify_token(token);
    match result.claims {
        Some(claims) if result.valid => Ok(claims),
        _ => Err(error_response(
            StatusCode::UNAUTHORIZED,
            result.error.unwrap_or_else(|| "Invalid token".into()),
        )),
    }
}

/// Pull one query parameter out of a request URI
pub fn query_param(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    let query = req.uri().query()?;
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}
