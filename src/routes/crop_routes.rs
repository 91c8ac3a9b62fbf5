//! HTTP routes for crop listings
//!
//! - GET  /api/crops                 - all listings
//! - GET  /api/crop-details/:cropId  - one listing joined to its farmer
//! - POST /api/crops                 - authenticated farmer adds a listing

use bson::{doc, oid::ObjectId};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{CropDoc, FarmerDoc, CROP_COLLECTION, FARMER_COLLECTION};
use crate::friends::EntityKind;
use crate::routes::{error_response, json_response, parse_json_body, require_auth, BoxBody};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCropRequest {
    #[serde(rename = "cropname")]
    pub crop_name: String,
    pub price: f64,
    #[serde(rename = "minquantity")]
    pub min_quantity: i64,
    #[serde(rename = "totalavailable")]
    pub total_available: i64,
    #[serde(rename = "img", default)]
    pub image: String,
    pub grade: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropView {
    #[serde(rename = "_id")]
    pub id: String,
    pub cropname: String,
    pub price: f64,
    pub minquantity: i64,
    pub totalavailable: i64,
    pub img: String,
    pub grade: String,
    pub farmer_id: String,
}

impl From<CropDoc> for CropView {
    fn from(doc: CropDoc) -> Self {
        Self {
            id: doc._id.map(|o| o.to_hex()).unwrap_or_default(),
            cropname: doc.crop_name,
            price: doc.price,
            minquantity: doc.min_quantity,
            totalavailable: doc.total_available,
            img: doc.image,
            grade: doc.grade,
            farmer_id: doc.farmer_id.to_hex(),
        }
    }
}

/// GET /api/crops
pub async fn handle_list_crops(state: Arc<AppState>) -> Response<BoxBody> {
    let collection = match state.mongo.collection::<CropDoc>(CROP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error(e),
    };

    match collection.find_many(doc! {}).await {
        Ok(crops) => {
            let views: Vec<CropView> = crops.into_iter().map(CropView::from).collect();
            json_response(StatusCode::OK, &views)
        }
        Err(e) => db_error(e),
    }
}

/// GET /api/crop-details/:cropId
pub async fn handle_crop_details(state: Arc<AppState>, crop_id: &str) -> Response<BoxBody> {
    let Ok(oid) = ObjectId::parse_str(crop_id) else {
        return error_response(StatusCode::NOT_FOUND, "Crop not found");
    };

    let collection = match state.mongo.collection::<CropDoc>(CROP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error(e),
    };

    let crop = match collection.find_one(doc! { "_id": oid }).await {
        Ok(Some(c)) => c,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Crop not found"),
        Err(e) => return db_error(e),
    };

    // Read-time join to the selling farmer's contact card
    let farmer = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
        Ok(c) => c.find_one(doc! { "_id": crop.farmer_id }).await.ok().flatten(),
        Err(_) => None,
    };

    let farmer_view = farmer.map(|f| {
        serde_json::json!({
            "id": crop.farmer_id.to_hex(),
            "name": f.display_name(),
            "phoneNumber": f.phone_number,
            "city": f.city,
            "state": f.state,
        })
    });

    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "success": true,
            "crop": CropView::from(crop),
            "farmer": farmer_view,
        }),
    )
}

/// POST /api/crops
pub async fn handle_add_crop(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match require_auth(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    if claims.user_type != EntityKind::Farmer {
        return error_response(StatusCode::FORBIDDEN, "Only farmers can list crops");
    }
    let Ok(farmer_oid) = ObjectId::parse_str(&claims.user_id) else {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid token subject");
    };

    let body: AddCropRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };

    if body.crop_name.trim().is_empty() || body.grade.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: cropname, grade",
        );
    }
    if body.price <= 0.0 || body.min_quantity <= 0 || body.total_available <= 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            "price, minquantity and totalavailable must be positive",
        );
    }

    let crops = match state.mongo.collection::<CropDoc>(CROP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error(e),
    };
    let farmers = match state.mongo.collection::<FarmerDoc>(FARMER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return db_error(e),
    };

    let crop_id = match crops
        .insert_one(CropDoc {
            crop_name: body.crop_name.trim().to_string(),
            price: body.price,
            min_quantity: body.min_quantity,
            total_available: body.total_available,
            image: body.image,
            grade: body.grade.trim().to_string(),
            farmer_id: farmer_oid,
            ..Default::default()
        })
        .await
    {
        Ok(id) => id,
        Err(e) => return db_error(e),
    };

    if let Err(e) = farmers
        .update_one(
            doc! { "_id": farmer_oid },
            doc! { "$addToSet": { "listed_crops": crop_id } },
        )
        .await
    {
        return db_error(e);
    }

    info!("Farmer {} listed crop {}", claims.user_id, crop_id.to_hex());
    json_response(
        StatusCode::CREATED,
        &serde_json::json!({
            "success": true,
            "message": "Crop listed successfully",
            "cropId": crop_id.to_hex(),
        }),
    )
}

fn db_error(e: impl std::fmt::Display) -> Response<BoxBody> {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        format!("Database error: {}", e),
    )
}
