//! Health check endpoint
//!
//! Liveness probe: returns 200 whenever the process is serving, with a
//! current database reachability flag for dashboards.

use bson::doc;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub database: DatabaseHealth,
    pub timestamp: String,
    pub node_id: String,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
}

/// GET /health
pub async fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    let connected = state
        .mongo
        .inner()
        .database(state.mongo.db_name())
        .run_command(doc! { "ping": 1 })
        .await
        .is_ok();

    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started_at.elapsed().as_secs(),
            database: DatabaseHealth { connected },
            timestamp: chrono::Utc::now().to_rfc3339(),
            node_id: state.args.node_id.to_string(),
        },
    )
}
