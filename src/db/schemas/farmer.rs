//! Farmer document schema
//!
//! A farmer account holds crop listings plus two confirmed-connection lists,
//! one per counterparty kind. Connections are symmetric: if a farmer's list
//! contains an id, that entity's matching list contains the farmer.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for farmers
pub const FARMER_COLLECTION: &str = "farmers";

/// Farmer document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FarmerDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub first_name: String,
    pub last_name: String,

    /// Login identifier, unique across the collection
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    pub phone_number: String,
    pub city: String,
    pub state: String,

    /// Crop listings owned by this farmer
    #[serde(default)]
    pub listed_crops: Vec<ObjectId>,

    /// Confirmed connections to other farmers
    #[serde(default)]
    pub farmer_friends: Vec<ObjectId>,

    /// Confirmed connections to firms
    #[serde(default)]
    pub firm_friends: Vec<ObjectId>,
}

impl FarmerDoc {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl IntoIndexes for FarmerDoc {
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

impl MutMetadata for FarmerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
