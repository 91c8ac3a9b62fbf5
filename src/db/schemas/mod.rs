//! Database schemas for HarvestLink
//!
//! Defines MongoDB document structures for farmers, firms, crop listings,
//! and the friend-request ledger.

mod crop;
mod farmer;
mod firm;
mod friend_request;

use bson::DateTime;
use serde::{Deserialize, Serialize};

pub use crop::{CropDoc, CROP_COLLECTION};
pub use farmer::{FarmerDoc, FARMER_COLLECTION};
pub use firm::{FirmDoc, FIRM_COLLECTION};
pub use friend_request::{FriendRequestDoc, FRIEND_REQUEST_COLLECTION, STATUS_PENDING};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata with current timestamps
    pub fn new() -> Self {
        Self {
            created_at: Some(DateTime::now()),
            updated_at: Some(DateTime::now()),
        }
    }
}
