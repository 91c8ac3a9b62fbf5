//! Crop listing document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for crop listings
pub const CROP_COLLECTION: &str = "crops";

/// Crop listing stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CropDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub crop_name: String,

    /// Price per unit
    pub price: f64,

    /// Minimum order quantity
    pub min_quantity: i64,

    /// Total quantity available
    pub total_available: i64,

    /// Opaque image reference (upload handling lives elsewhere)
    pub image: String,

    pub grade: String,

    /// Owning farmer
    pub farmer_id: ObjectId,
}

impl IntoIndexes for CropDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "farmer_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("farmer_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for CropDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
