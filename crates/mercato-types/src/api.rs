use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ListingStatus, Role};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and token issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    // Vendor profile fields, required when role == vendor
    pub business_name: Option<String>,
    pub city: Option<String>,
    pub vat_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Listings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

/// Partial update: only the provided fields are written. `status` is a plain
/// string so an invalid value surfaces as a 400 instead of a body rejection;
/// it must name a transition the owning vendor is allowed to make.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct PublicListingResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub business_name: String,
    pub is_verified: bool,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VendorListingResponse {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub vendor_user_id: Uuid,
    pub business_name: String,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub status: ListingStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
    pub listing_id: Option<Uuid>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub subject: Option<String>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_title: Option<String>,
}

// -- Favorites --

#[derive(Debug, Serialize)]
pub struct FavoriteListingResponse {
    pub listing_id: Uuid,
    pub title: String,
    pub city: Option<String>,
    pub status: ListingStatus,
    pub image_url: Option<String>,
    pub business_name: String,
    pub favorited_at: DateTime<Utc>,
}

// -- Vendors --

#[derive(Debug, Serialize)]
pub struct VendorResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub vat_number: Option<String>,
    pub city: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

// -- Categories --

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
}
