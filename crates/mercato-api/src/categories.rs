use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use mercato_types::api::CategoryResponse;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::util::parse_uuid;

/// Static, read-only category list for the public browse filters.
pub async fn get_all(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories: Vec<CategoryResponse> = state
        .db
        .get_active_categories()?
        .into_iter()
        .map(|row| CategoryResponse {
            id: parse_uuid(&row.id, "category id"),
            name: row.name,
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "results": categories.len(),
        "data": { "categories": categories }
    })))
}
