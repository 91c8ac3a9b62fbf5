//! Firm (buyer) document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for firms
pub const FIRM_COLLECTION: &str = "firms";

/// Firm document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FirmDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_name: String,
    pub contact_person: String,

    /// Login identifier, unique across the collection
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    pub phone_number: String,
    pub city: String,
    pub state: String,

    /// Confirmed connections to farmers
    #[serde(default)]
    pub farmer_friends: Vec<ObjectId>,

    /// Confirmed connections to other firms
    #[serde(default)]
    pub firm_friends: Vec<ObjectId>,
}

impl IntoIndexes for FirmDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for FirmDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
