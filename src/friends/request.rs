//! Domain types for the relationship subsystem

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::friends::{EntityKind, EntityRef};

/// A pending friend request as seen by the state machine
#[derive(Debug, Clone, PartialEq)]
pub struct FriendRequest {
    /// Ledger row identity
    pub id: String,
    pub sender: EntityRef,
    pub receiver: EntityRef,
    /// Creation time, used for display ordering only
    pub created_at: DateTime<Utc>,
}

/// Display attributes of an entity, joined fresh at query time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderSnapshot {
    /// Farmer full name or firm company name
    pub name: String,
    pub city: String,
    pub state: String,
    /// Contact number, present when the store carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A pending request resolved for the receiver's inbox
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    #[serde(rename = "_id")]
    pub id: String,
    pub sender_type: EntityKind,
    pub sender: SenderSnapshot,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Summary of a confirmed connection for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Both connection lists of an entity, resolved to summaries
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLists {
    pub farmers: Vec<FriendSummary>,
    pub firms: Vec<FriendSummary>,
}
