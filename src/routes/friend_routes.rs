//! HTTP routes for the friend-relationship subsystem
//!
//! - GET  /api/users                           - combined farmer+firm directory
//! - GET  /api/friend-profile/:id?userType=    - public profile of one entity
//! - GET  /api/friends/:userId?userType=       - resolved connection lists
//! - POST /api/friend-request                  - create a pending request
//! - GET  /api/friend-requests/:userId         - receiver's pending inbox
//! - POST /api/friend-requests/accept/:reqId   - accept (symmetric connect)
//! - POST /api/friend-requests/reject/:reqId   - reject (discard)

use bson::doc;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::db::schemas::{CropDoc, FarmerDoc, FirmDoc, CROP_COLLECTION, FARMER_COLLECTION, FIRM_COLLECTION};
use crate::friends::{EntityKind, EntityRef, FriendError, PendingRequestView};
use crate::routes::crop_routes::CropView;
use crate::routes::{
    error_response, json_response, parse_json_body, query_param, BoxBody,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_type: String,
    pub receiver_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestCreated {
    pub message: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct PendingInbox {
    pub success: bool,
    pub requests: Vec<PendingRequestView>,
}

/// Directory entry for the combined users listing
#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "userType")]
    pub user_type: EntityKind,
}

fn friend_error(e: FriendError) -> Response<BoxBody> {
    if let FriendError::Store(ref detail) = e {
        warn!("Relationship storage failure: {}", detail);
    }
    error_response(e.status_code(), e.to_string())
}

/// POST /api/friend-request
pub async fn handle_friend_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: FriendRequestBody = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };

    let (sender_kind, receiver_kind) = match (
        EntityKind::from_str(&body.sender_type),
        EntityKind::from_str(&body.receiver_type),
    ) {
        (Ok(s), Ok(r)) => (s, r),
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid sender or receiver type"),
    };

    let sender = EntityRef::new(body.sender_id, sender_kind);
    let receiver = EntityRef::new(body.receiver_id, receiver_kind);

    let request_id = match state.friends.send_request(&sender, &receiver).await {
        Ok(id) => id,
        Err(e) => return friend_error(e),
    };

    // Courtesy SMS to the receiver; never affects the API result
    if let Some(sms) = state.sms.clone() {
        let friends = state.friends.clone();
        tokio::spawn(async move {
            let receiver_snapshot = friends.store().entity_snapshot(&receiver).await;
            let sender_snapshot = friends.store().entity_snapshot(&sender).await;
            if let (Ok(Some(to)), Ok(Some(from))) = (receiver_snapshot, sender_snapshot) {
                if let Some(phone) = to.phone {
                    if let Err(e) = sms.notify_friend_request(&phone, &from.name).await {
                        warn!("Friend-request SMS failed: {}", e);
                    }
                }
            }
        });
    }

    json_response(
        StatusCode::OK,
        &FriendRequestCreated {
            message: "Friend request sent successfully".into(),
            request_id,
        },
    )
}

/// GET /api/friend-requests/:userId
pub async fn handle_list_requests(state: Arc<AppState>, user_id: &str) -> Response<BoxBody> {
    match state.friends.pending_for_receiver(user_id).await {
        Ok(requests) => json_response(
            StatusCode::OK,
            &PendingInbox {
                success: true,
                requests,
            },
        ),
        Err(e) => friend_error(e),
    }
}

/// POST /api/friend-requests/accept/:reqId
pub async fn handle_accept_request(state: Arc<AppState>, request_id: &str) -> Response<BoxBody> {
    match state.friends.accept_request(request_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Friend request accepted successfully" }),
        ),
        Err(e) => friend_error(e),
    }
}

/// POST /api/friend-requests/reject/:reqId
pub async fn handle_reject_request(state: Arc<AppState>, request_id: &str) -> Response<BoxBody> {
    match state.friends.reject_request(request_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": "Friend request rejected successfully" }),
        ),
        Err(e) => friend_error(e),
    }
}

/// GET /api/friends/:userId?userType=
pub async fn handle_friends_list(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: &str,
) -> Response<BoxBody> {
    let kind = match query_param(&req, "userType").map(|t| EntityKind::from_str(&t)) {
        Some(Ok(k)) => k,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid user type specified"),
    };

    let entity = EntityRef::new(user_id, kind);
    match state.friends.connections_of(&entity).await {
        Ok(Some(lists)) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "friends": lists }),
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => friend_error(e),
    }
}

/// GET /api/users
pub async fn handle_list_users(state: Arc<AppState>) -> Response<BoxBody> {
    let farmers = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
        Ok(c) => c.find_many(doc! {}).await,
        Err(e) => Err(e),
    };
    let firms = match state.mongo.collection::<FirmDoc>(FIRM_COLLECTION).await {
        Ok(c) => c.find_many(doc! {}).await,
        Err(e) => Err(e),
    };

    let (farmers, firms) = match (farmers, firms) {
        (Ok(fa), Ok(fi)) => (fa, fi),
        (Err(e), _) | (_, Err(e)) => {
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Database error: {}", e),
            )
        }
    };

    let mut users: Vec<DirectoryEntry> = Vec::with_capacity(farmers.len() + firms.len());
    users.extend(farmers.into_iter().filter_map(|f| {
        Some(DirectoryEntry {
            id: f._id?.to_hex(),
            name: f.display_name(),
            city: f.city,
            state: f.state,
            user_type: EntityKind::Farmer,
        })
    }));
    users.extend(firms.into_iter().filter_map(|f| {
        Some(DirectoryEntry {
            id: f._id?.to_hex(),
            name: f.company_name,
            city: f.city,
            state: f.state,
            user_type: EntityKind::Firm,
        })
    }));

    json_response(StatusCode::OK, &users)
}

/// GET /api/friend-profile/:id?userType=
///
/// Public profile without the password hash; farmers include their listed
/// crops, joined at read time.
pub async fn handle_friend_profile(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    id: &str,
) -> Response<BoxBody> {
    let kind = match query_param(&req, "userType").map(|t| EntityKind::from_str(&t)) {
        Some(Ok(k)) => k,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid user type specified"),
    };

    let Ok(oid) = bson::oid::ObjectId::parse_str(id) else {
        return error_response(StatusCode::NOT_FOUND, "User not found");
    };

    let profile = match kind {
        EntityKind::Farmer => {
            let collection = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
                Ok(c) => c,
                Err(e) => {
                    return error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        format!("Database error: {}", e),
                    )
                }
            };
            let Ok(found) = collection.find_one(doc! { "_id": oid }).await else {
                return error_response(StatusCode::SERVICE_UNAVAILABLE, "Database error");
            };
            let Some(farmer) = found else {
                return error_response(StatusCode::NOT_FOUND, "User not found");
            };

            let crops: Vec<CropView> = match state.mongo.collection::<CropDoc>(CROP_COLLECTION).await {
                Ok(c) => c
                    .find_many(doc! { "_id": { "$in": &farmer.listed_crops } })
                    .await
                    .unwrap_or_default()
                    .into_iter()
                    .map(CropView::from)
                    .collect(),
                Err(_) => Vec::new(),
            };

            serde_json::json!({
                "_id": oid.to_hex(),
                "userType": EntityKind::Farmer,
                "name": farmer.display_name(),
                "email": farmer.email,
                "phoneNumber": farmer.phone_number,
                "city": farmer.city,
                "state": farmer.state,
                "listedCrops": crops,
            })
        }
        EntityKind::Firm => {
            let collection = match state.mongo.collection::<FirmDoc>(FIRM_COLLECTION).await {
                Ok(c) => c,
                Err(e) => {
                    return error_response(
                        StatusCode::SERVICE_UNAVAILABLE,
                        format!("Database error: {}", e),
                    )
                }
            };
            let Ok(found) = collection.find_one(doc! { "_id": oid }).await else {
                return error_response(StatusCode::SERVICE_UNAVAILABLE, "Database error");
            };
            let Some(firm) = found else {
                return error_response(StatusCode::NOT_FOUND, "User not found");
            };

            serde_json::json!({
                "_id": oid.to_hex(),
                "userType": EntityKind::Firm,
                "name": firm.company_name,
                "contactPerson": firm.contact_person,
                "email": firm.email,
                "phoneNumber": firm.phone_number,
                "city": firm.city,
                "state": firm.state,
            })
        }
    };

    json_response(
        StatusCode::OK,
        &serde_json::json!({ "success": true, "profile": profile }),
    )
}
