use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;

use mercato_types::api::{Claims, VendorResponse};
use mercato_types::models::Role;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::require_role;
use crate::util::{parse_utc, parse_uuid};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    require_role(&claims, Role::Vendor)?;

    let vendor = state
        .db
        .get_vendor_by_user_id(&claims.sub.to_string())?
        .ok_or_else(|| ApiError::not_found("Vendor profile not found"))?;

    let response = VendorResponse {
        id: parse_uuid(&vendor.id, "vendor id"),
        user_id: parse_uuid(&vendor.user_id, "vendor user id"),
        business_name: vendor.business_name,
        vat_number: vendor.vat_number,
        city: vendor.city,
        is_verified: vendor.is_verified,
        created_at: parse_utc(&vendor.created_at, "vendor created_at"),
    };

    Ok(Json(json!({
        "status": "success",
        "data": { "vendor": response }
    })))
}
