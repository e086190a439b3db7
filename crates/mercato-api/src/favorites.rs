use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use mercato_db::models::FavoriteListingRow;
use mercato_types::api::{Claims, FavoriteListingResponse};
use mercato_types::models::{ListingStatus, Role};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::require_role;
use crate::util::{parse_utc, parse_uuid};

/// The favoriting user is always the authenticated caller; the user id never
/// comes from the request.
pub async fn add(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Customer)?;

    if state.db.get_listing_owner(&listing_id.to_string())?.is_none() {
        return Err(ApiError::not_found("Listing not found"));
    }

    // Idempotent: re-favoriting reports success without a new row
    state
        .db
        .add_favorite(&claims.sub.to_string(), &listing_id.to_string())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "is_favorited": true }
        })),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Customer)?;

    // Removing a non-favorite still succeeds
    state
        .db
        .remove_favorite(&claims.sub.to_string(), &listing_id.to_string())?;

    Ok(Json(json!({
        "status": "success",
        "data": { "is_favorited": false }
    })))
}

pub async fn check(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Customer)?;

    let is_favorited = state
        .db
        .is_favorited(&claims.sub.to_string(), &listing_id.to_string())?;

    Ok(Json(json!({
        "status": "success",
        "data": { "is_favorited": is_favorited }
    })))
}

pub async fn get_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Customer)?;

    let favorites: Vec<FavoriteListingResponse> = state
        .db
        .get_favorites(&claims.sub.to_string())?
        .into_iter()
        .map(favorite_response)
        .collect();

    Ok(Json(json!({
        "status": "success",
        "results": favorites.len(),
        "data": { "favorites": favorites }
    })))
}

fn favorite_response(row: FavoriteListingRow) -> FavoriteListingResponse {
    let status = row.status.parse().unwrap_or_else(|e| {
        tracing::warn!("Corrupt listing status on favorite '{}': {e}", row.listing_id);
        ListingStatus::Draft
    });

    FavoriteListingResponse {
        listing_id: parse_uuid(&row.listing_id, "listing id"),
        title: row.title,
        city: row.city,
        status,
        image_url: row.image_url,
        business_name: row.business_name,
        favorited_at: parse_utc(&row.favorited_at, "favorited_at"),
    }
}
