//! Friend-request ledger document schema
//!
//! One row per outstanding request. Accepted and rejected requests are
//! deleted rather than retained, so the collection only ever holds Pending
//! rows. Uniqueness of the direction-sensitive (sender, receiver, kinds)
//! tuple is enforced by a partial unique index so that two racing inserts
//! cannot both succeed.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::friends::EntityKind;

/// Collection name for friend requests
pub const FRIEND_REQUEST_COLLECTION: &str = "friend_requests";

/// The only status ever persisted
pub const STATUS_PENDING: &str = "Pending";

/// Friend request stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FriendRequestDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub sender_id: ObjectId,
    pub sender_kind: EntityKind,
    pub receiver_id: ObjectId,
    pub receiver_kind: EntityKind,

    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

impl Default for FriendRequestDoc {
    fn default() -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            sender_id: ObjectId::new(),
            sender_kind: EntityKind::Farmer,
            receiver_id: ObjectId::new(),
            receiver_kind: EntityKind::Farmer,
            status: default_status(),
        }
    }
}

impl IntoIndexes for FriendRequestDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Direction-sensitive uniqueness: a reverse-direction pending
            // request does not collide with this tuple.
            (
                doc! {
                    "sender_id": 1,
                    "receiver_id": 1,
                    "sender_kind": 1,
                    "receiver_kind": 1,
                },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "status": STATUS_PENDING })
                        .name("pending_tuple_unique".to_string())
                        .build(),
                ),
            ),
            // Inbox lookups
            (
                doc! { "receiver_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("receiver_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for FriendRequestDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
