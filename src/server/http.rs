//! HTTP server implementation
//!
//! hyper http1 accept loop with a per-request `(Method, path)` match.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::friends::RelationshipManager;
use crate::routes::{self, cors_preflight, not_found_response, BoxBody};
use crate::sms::SmsClient;
use crate::types::HarvestError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub jwt: JwtValidator,
    /// The relationship state machine over the MongoDB store
    pub friends: RelationshipManager,
    /// SMS gateway client; None when notification config is absent
    pub sms: Option<SmsClient>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: MongoClient,
        jwt: JwtValidator,
        friends: RelationshipManager,
        sms: Option<SmsClient>,
    ) -> Self {
        Self {
            args,
            mongo,
            jwt,
            friends,
            sms,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), HarvestError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "HarvestLink listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    if state.sms.is_some() {
        info!("SMS notifications enabled");
    } else {
        info!("SMS notifications disabled (no gateway configured)");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    // Auth routes consume the request
    if path.starts_with("/api/auth/") {
        return Ok(routes::handle_auth_request(req, state).await);
    }

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state)).await
        }

        // Directory and profiles
        (Method::GET, "/api/users") => routes::handle_list_users(Arc::clone(&state)).await,
        (Method::GET, p) if p.starts_with("/api/friend-profile/") => {
            let id = p.trim_start_matches("/api/friend-profile/").to_string();
            routes::handle_friend_profile(req, Arc::clone(&state), &id).await
        }
        (Method::GET, p) if p.starts_with("/api/friends/") => {
            let id = p.trim_start_matches("/api/friends/").to_string();
            routes::handle_friends_list(req, Arc::clone(&state), &id).await
        }

        // Friend-request lifecycle
        (Method::POST, "/api/friend-request") => {
            routes::handle_friend_request(req, Arc::clone(&state)).await
        }
        (Method::POST, p) if p.starts_with("/api/friend-requests/accept/") => {
            let id = p.trim_start_matches("/api/friend-requests/accept/");
            routes::handle_accept_request(Arc::clone(&state), id).await
        }
        (Method::POST, p) if p.starts_with("/api/friend-requests/reject/") => {
            let id = p.trim_start_matches("/api/friend-requests/reject/");
            routes::handle_reject_request(Arc::clone(&state), id).await
        }
        (Method::GET, p) if p.starts_with("/api/friend-requests/") => {
            let id = p.trim_start_matches("/api/friend-requests/");
            routes::handle_list_requests(Arc::clone(&state), id).await
        }

        // Crop listings
        (Method::GET, "/api/crops") => routes::handle_list_crops(Arc::clone(&state)).await,
        (Method::POST, "/api/crops") => routes::handle_add_crop(req, Arc::clone(&state)).await,
        (Method::GET, p) if p.starts_with("/api/crop-details/") => {
            let id = p.trim_start_matches("/api/crop-details/");
            routes::handle_crop_details(Arc::clone(&state), id).await
        }

        (_, p) => not_found_response(p),
    };

    Ok(response)
}
