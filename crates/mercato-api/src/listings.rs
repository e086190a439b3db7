use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use mercato_db::models::{ListingOwnerRow, ListingUpdate, NewListing, PublicListingRow, VendorListingRow};
use mercato_db::queries::ListingFilters;
use mercato_types::api::{
    Claims, CreateListingRequest, PublicListingResponse, UpdateListingRequest,
    UpdateListingStatusRequest, VendorListingResponse,
};
use mercato_types::models::{ListingStatus, Role};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::require_role;
use crate::util::{parse_utc, parse_uuid};

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Public browse: active listings only, optionally filtered.
pub async fn get_all(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<impl IntoResponse> {
    let filters = ListingFilters {
        city: query.city,
        category: query.category,
        search: query.search,
    };

    // Run the blocking DB query off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.get_public_listings(&filters))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("listing query task failed")
        })??;

    let listings: Vec<PublicListingResponse> = rows.into_iter().map(public_response).collect();

    Ok(Json(json!({
        "status": "success",
        "results": listings.len(),
        "data": { "listings": listings }
    })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .db
        .get_public_listing(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "listing": public_response(row) }
    })))
}

/// Vendor creates a draft listing; category links land in the same
/// transaction as the listing row.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Vendor)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let vendor = state
        .db
        .get_vendor_by_user_id(&claims.sub.to_string())?
        .ok_or_else(|| {
            ApiError::not_found("Vendor profile not found. Please complete your vendor registration.")
        })?;

    let listing_id = Uuid::new_v4().to_string();
    let category_ids: Vec<String> = req.category_ids.iter().map(Uuid::to_string).collect();

    state.db.create_listing(
        &NewListing {
            id: &listing_id,
            vendor_id: &vendor.id,
            title: &req.title,
            description: req.description.as_deref(),
            city: req.city.as_deref(),
            contact_email: req.contact_email.as_deref(),
            contact_phone: req.contact_phone.as_deref(),
            opening_hours: req.opening_hours.as_deref(),
        },
        &category_ids,
    )?;

    let row = state
        .db
        .get_vendor_listing(&listing_id)?
        .ok_or_else(|| anyhow::anyhow!("listing {listing_id} vanished after insert"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Listing created successfully",
            "data": { "listing": vendor_response(row) }
        })),
    ))
}

/// Vendor's own listings, every status.
pub async fn get_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Vendor)?;

    let listings: Vec<VendorListingResponse> = state
        .db
        .get_vendor_listings(&claims.sub.to_string())?
        .into_iter()
        .map(vendor_response)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "results": listings.len(),
        "data": { "listings": listings }
    })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateListingRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Vendor)?;

    let owner = fetch_owned(&state, &id, &claims)?;

    let status = validate_vendor_status(&owner, req.status.as_deref())?;
    // A request that only repeats the current status is a valid no-op
    let status_echoed = status.is_none() && req.status.is_some();

    let update = ListingUpdate {
        title: req.title,
        description: req.description,
        city: req.city,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        opening_hours: req.opening_hours,
        image_url: req.image_url,
        status,
        category_ids: req
            .category_ids
            .map(|ids| ids.iter().map(Uuid::to_string).collect()),
    };

    if update.is_empty() {
        if !status_echoed {
            return Err(ApiError::validation("No valid fields to update"));
        }
    } else {
        state.db.update_listing(&owner.id, &update)?;
    }

    let row = state
        .db
        .get_vendor_listing(&owner.id)?
        .ok_or_else(|| anyhow::anyhow!("listing {} vanished after update", owner.id))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Listing updated successfully",
        "data": { "listing": vendor_response(row) }
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Vendor)?;

    let owner = fetch_owned(&state, &id, &claims)?;
    state.db.delete_listing(&owner.id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Admin view of all listings, every status.
pub async fn get_all_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Admin)?;

    let listings: Vec<VendorListingResponse> = state
        .db
        .get_all_listings()?
        .into_iter()
        .map(vendor_response)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "results": listings.len(),
        "data": { "listings": listings }
    })))
}

/// Admin moderation: submitted listings become active or rejected, nothing else.
pub async fn update_status_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateListingStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Admin)?;

    let to: ListingStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::validation("Status must be 'active' or 'rejected'"))?;
    if !matches!(to, ListingStatus::Active | ListingStatus::Rejected) {
        return Err(ApiError::validation("Status must be 'active' or 'rejected'"));
    }

    let owner = state
        .db
        .get_listing_owner(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    let from: ListingStatus = owner.status.parse().map_err(anyhow::Error::msg)?;
    if !from.admin_can_transition(to) {
        return Err(ApiError::validation(format!(
            "Cannot move listing from '{from}' to '{to}'"
        )));
    }

    state.db.update_listing_status(&owner.id, to.as_str())?;

    let row = state
        .db
        .get_vendor_listing(&owner.id)?
        .ok_or_else(|| anyhow::anyhow!("listing {} vanished after status update", owner.id))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Listing status updated",
        "data": { "listing": vendor_response(row) }
    })))
}

/// Loads the listing and checks it belongs to the requesting vendor.
fn fetch_owned(state: &AppState, id: &Uuid, claims: &Claims) -> ApiResult<ListingOwnerRow> {
    let owner = state
        .db
        .get_listing_owner(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Listing not found"))?;

    if owner.vendor_user_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "You do not have permission to modify this listing",
        ));
    }

    Ok(owner)
}

/// A vendor may keep the current status or make one of the guarded moves
/// (draft -> submitted, rejected -> submitted). Returns the status string to
/// write, None when the field was absent or unchanged.
fn validate_vendor_status(
    owner: &ListingOwnerRow,
    requested: Option<&str>,
) -> ApiResult<Option<String>> {
    let Some(requested) = requested else {
        return Ok(None);
    };

    let to: ListingStatus = requested
        .parse()
        .map_err(|e: String| ApiError::validation(e))?;
    let from: ListingStatus = owner.status.parse().map_err(anyhow::Error::msg)?;

    if to == from {
        return Ok(None);
    }
    if !from.vendor_can_transition(to) {
        return Err(ApiError::validation(format!(
            "Cannot move listing from '{from}' to '{to}'"
        )));
    }

    Ok(Some(to.as_str().to_string()))
}

fn public_response(row: PublicListingRow) -> PublicListingResponse {
    // The view joins names with the unit separator, see public_listings_view
    let categories = row
        .categories
        .as_deref()
        .map(|joined| joined.split('\u{1f}').map(str::to_string).collect())
        .unwrap_or_default();

    PublicListingResponse {
        id: parse_uuid(&row.listing_id, "listing id"),
        vendor_id: parse_uuid(&row.vendor_id, "vendor id"),
        business_name: row.business_name,
        is_verified: row.is_verified,
        title: row.title,
        description: row.description,
        city: row.city,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
        opening_hours: row.opening_hours,
        image_url: row.image_url,
        categories,
        created_at: parse_utc(&row.created_at, "listing created_at"),
        updated_at: parse_utc(&row.updated_at, "listing updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_row(categories: Option<&str>) -> PublicListingRow {
        PublicListingRow {
            listing_id: "11111111-1111-1111-1111-111111111111".into(),
            vendor_id: "22222222-2222-2222-2222-222222222222".into(),
            business_name: "Shop".into(),
            is_verified: false,
            title: "Things".into(),
            description: None,
            city: None,
            contact_email: None,
            contact_phone: None,
            opening_hours: None,
            image_url: None,
            categories: categories.map(str::to_string),
            created_at: "2026-01-01 00:00:00".into(),
            updated_at: "2026-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn category_names_with_commas_stay_whole() {
        let resp = public_response(public_row(Some("Tools, Hardware & Paint\u{1f}Bakery")));
        assert_eq!(resp.categories, ["Tools, Hardware & Paint", "Bakery"]);

        let resp = public_response(public_row(None));
        assert!(resp.categories.is_empty());
    }
}

fn vendor_response(row: VendorListingRow) -> VendorListingResponse {
    let status = row.status.parse().unwrap_or_else(|e| {
        tracing::warn!("Corrupt listing status on '{}': {e}", row.listing_id);
        ListingStatus::Draft
    });

    VendorListingResponse {
        id: parse_uuid(&row.listing_id, "listing id"),
        vendor_id: parse_uuid(&row.vendor_id, "vendor id"),
        vendor_user_id: parse_uuid(&row.vendor_user_id, "vendor user id"),
        business_name: row.business_name,
        title: row.title,
        description: row.description,
        city: row.city,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
        opening_hours: row.opening_hours,
        status,
        image_url: row.image_url,
        created_at: parse_utc(&row.created_at, "listing created_at"),
        updated_at: parse_utc(&row.updated_at, "listing updated_at"),
    }
}
