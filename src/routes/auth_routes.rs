//! HTTP routes for authentication
//!
//! - POST /api/auth/signup - Register a farmer or firm account
//! - POST /api/auth/login  - Authenticate and get a JWT token
//! - POST /api/auth/logout - Stateless confirmation (token lives client-side)
//! - GET  /api/auth/check  - Token introspection for the frontend

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, TokenInput};
use crate::db::schemas::{FarmerDoc, FirmDoc, FARMER_COLLECTION, FIRM_COLLECTION};
use crate::friends::EntityKind;
use crate::routes::{
    cors_preflight, error_response, json_response, parse_json_body, require_auth, BoxBody,
    ErrorResponse,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(rename = "userType")]
    pub user_type: String,

    // Farmer-specific
    #[serde(rename = "FirstName", default)]
    pub first_name: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,

    // Firm-specific
    #[serde(rename = "CompanyName", default)]
    pub company_name: String,
    #[serde(rename = "ContactPerson", default)]
    pub contact_person: String,

    pub email: String,
    pub password: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub _id: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub user_type: EntityKind,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub redirect: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Route /api/auth/* requests
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().split('?').next().unwrap_or("").to_string();
    let method = req.method().clone();

    if method == Method::OPTIONS {
        return cors_preflight();
    }

    match (&method, path.as_str()) {
        (&Method::POST, "/api/auth/signup") => handle_signup(req, state).await,
        (&Method::POST, "/api/auth/login") => handle_login(req, state).await,
        (&Method::POST, "/api/auth/logout") => handle_logout().await,
        (&Method::GET, "/api/auth/check") => handle_check(req, state).await,

        (_, "/api/auth/signup") | (_, "/api/auth/login") | (_, "/api/auth/logout")
        | (_, "/api/auth/check") => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }

        _ => error_response(StatusCode::NOT_FOUND, "Auth endpoint not found"),
    }
}

/// POST /api/auth/signup
async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SignupRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };

    let kind = match EntityKind::from_str(&body.user_type) {
        Ok(k) => k,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid user type"),
    };

    if body.email.is_empty()
        || body.password.is_empty()
        || body.phone_number.is_empty()
        || body.city.is_empty()
        || body.state.is_empty()
    {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: email, password, phoneNumber, city, state",
        );
    }
    match kind {
        EntityKind::Farmer if body.first_name.trim().is_empty() => {
            return error_response(StatusCode::BAD_REQUEST, "First Name is required");
        }
        EntityKind::Firm if body.company_name.trim().is_empty() => {
            return error_response(StatusCode::BAD_REQUEST, "Company Name is required");
        }
        _ => {}
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            warn!("Password hashing failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Registration failed");
        }
    };

    let email = body.email.trim().to_lowercase();

    let insert_result = match kind {
        EntityKind::Farmer => {
            let collection = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
                Ok(c) => c,
                Err(e) => return db_error(e),
            };
            collection
                .insert_one(FarmerDoc {
                    first_name: body.first_name.trim().to_string(),
                    last_name: body.last_name.trim().to_string(),
                    email: email.clone(),
                    password_hash,
                    phone_number: body.phone_number.trim().to_string(),
                    city: body.city.trim().to_string(),
                    state: body.state.trim().to_string(),
                    ..Default::default()
                })
                .await
        }
        EntityKind::Firm => {
            let collection = match state.mongo.collection::<FirmDoc>(FIRM_COLLECTION).await {
                Ok(c) => c,
                Err(e) => return db_error(e),
            };
            collection
                .insert_one(FirmDoc {
                    company_name: body.company_name.trim().to_string(),
                    contact_person: body.contact_person.trim().to_string(),
                    email: email.clone(),
                    password_hash,
                    phone_number: body.phone_number.trim().to_string(),
                    city: body.city.trim().to_string(),
                    state: body.state.trim().to_string(),
                    ..Default::default()
                })
                .await
        }
    };

    match insert_result {
        Ok(id) => {
            info!("Registered {} account {} ({})", kind, id.to_hex(), email);
            json_response(
                StatusCode::CREATED,
                &SignupResponse {
                    success: true,
                    message: "User registered successfully".into(),
                    redirect: "/login-page",
                },
            )
        }
        // Unique email index violation surfaces as a duplicate-key write error
        Err(e) if e.to_string().contains("E11000") => json_response(
            StatusCode::CONFLICT,
            &ErrorResponse {
                error: "Email already exists".into(),
                code: Some("DUPLICATE_EMAIL".into()),
            },
        ),
        Err(e) => db_error(e),
    }
}

/// POST /api/auth/login
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };

    let kind = match EntityKind::from_str(&body.user_type) {
        Ok(k) => k,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid user type"),
    };

    if body.email.is_empty() || body.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: email, password",
        );
    }

    let email = body.email.trim().to_lowercase();
    let filter = doc! { "email": &email };

    // One collection per role; the same generic error for a missing account
    // and a bad password prevents user enumeration.
    let (id, password_hash) = match kind {
        EntityKind::Farmer => {
            let collection = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
                Ok(c) => c,
                Err(e) => return db_error(e),
            };
            match collection.find_one(filter).await {
                Ok(Some(u)) => (u._id, u.password_hash),
                Ok(None) => return invalid_credentials(&email),
                Err(e) => return db_error(e),
            }
        }
        EntityKind::Firm => {
            let collection = match state.mongo.collection::<FirmDoc>(FIRM_COLLECTION).await {
                Ok(c) => c,
                Err(e) => return db_error(e),
            };
            match collection.find_one(filter).await {
                Ok(Some(u)) => (u._id, u.password_hash),
                Ok(None) => return invalid_credentials(&email),
                Err(e) => return db_error(e),
            }
        }
    };

    let Some(id) = id else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Malformed account record");
    };

    match verify_password(&body.password, &password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(&email),
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error");
        }
    }

    let token = match state.jwt.generate_token(TokenInput {
        user_id: id.to_hex(),
        email: email.clone(),
        user_type: kind,
    }) {
        Ok(t) => t,
        Err(e) => {
            warn!("Token generation failed: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication error");
        }
    };

    info!("Login successful: {} ({})", email, kind);
    json_response(
        StatusCode::OK,
        &LoginResponse {
            message: "Login successful".into(),
            token,
            user: UserInfo {
                _id: id.to_hex(),
                email,
                user_type: kind,
            },
        },
    )
}

/// POST /api/auth/logout
///
/// Tokens are held client-side; logout is acknowledged without server state.
async fn handle_logout() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({ "message": "Logged out successfully" }),
    )
}

/// GET /api/auth/check
async fn handle_check(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match require_auth(&req, &state) {
        Ok(c) => c,
        Err(_) => {
            // An absent or expired token is not an error for this probe
            return json_response(
                StatusCode::OK,
                &CheckAuthResponse {
                    is_logged_in: false,
                    user: None,
                },
            );
        }
    };

    // Confirm the account still exists
    let exists = state
        .friends
        .store()
        .entity_exists(&crate::friends::EntityRef::new(
            claims.user_id.clone(),
            claims.user_type,
        ))
        .await
        .unwrap_or(false);

    if !exists {
        return json_response(
            StatusCode::OK,
            &CheckAuthResponse {
                is_logged_in: false,
                user: None,
            },
        );
    }

    json_response(
        StatusCode::OK,
        &CheckAuthResponse {
            is_logged_in: true,
            user: Some(UserInfo {
                _id: claims.user_id,
                email: claims.email,
                user_type: claims.user_type,
            }),
        },
    )
}

fn invalid_credentials(email: &str) -> Response<BoxBody> {
    warn!("Login failed: {}", email);
    error_response(StatusCode::UNAUTHORIZED, "Invalid Credentials")
}

fn db_error(e: impl std::fmt::Display) -> Response<BoxBody> {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        format!("Database error: {}", e),
    )
}
