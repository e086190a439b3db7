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

use mercato_db::models::MessageRow;
use mercato_types::api::{Claims, MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::util::{parse_opt_uuid, parse_utc, parse_uuid};

#[derive(Debug, Default, Deserialize)]
pub struct ConversationQuery {
    pub listing_id: Option<Uuid>,
}

pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("Message content is required"));
    }
    if req.recipient_id == claims.sub {
        return Err(ApiError::validation("You cannot message yourself"));
    }

    if state
        .db
        .get_user_by_id(&req.recipient_id.to_string())?
        .is_none()
    {
        return Err(ApiError::not_found("Recipient not found"));
    }
    if let Some(listing_id) = &req.listing_id {
        if state.db.get_listing_owner(&listing_id.to_string())?.is_none() {
            return Err(ApiError::not_found("Listing not found"));
        }
    }

    let message_id = Uuid::new_v4().to_string();
    let subject = req.subject.as_deref().filter(|s| !s.is_empty());

    state.db.insert_message(
        &message_id,
        &claims.sub.to_string(),
        &req.recipient_id.to_string(),
        req.listing_id.map(|id| id.to_string()).as_deref(),
        subject,
        &req.content,
    )?;

    let row = state
        .db
        .get_message(&message_id)?
        .ok_or_else(|| anyhow::anyhow!("message {message_id} vanished after insert"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "message": message_response(row) }
        })),
    ))
}

pub async fn inbox(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    // Run the blocking DB query off the async runtime
    let rows = tokio::task::spawn_blocking(move || db.db.get_inbox(&user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("inbox query task failed")
        })??;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_response).collect();

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": { "messages": messages }
    })))
}

pub async fn sent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    let rows = tokio::task::spawn_blocking(move || db.db.get_sent(&user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            anyhow::anyhow!("sent query task failed")
        })??;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_response).collect();

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": { "messages": messages }
    })))
}

/// Thread between the caller and another user, oldest first. A `listing_id`
/// query parameter narrows the thread to one listing.
pub async fn conversation(
    State(state): State<AppState>,
    Path(other_user_id): Path<Uuid>,
    Query(query): Query<ConversationQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let rows = state.db.get_conversation(
        &claims.sub.to_string(),
        &other_user_id.to_string(),
        query.listing_id.map(|id| id.to_string()).as_deref(),
    )?;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_response).collect();

    Ok(Json(json!({
        "status": "success",
        "results": messages.len(),
        "data": { "messages": messages }
    })))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let row = fetch_visible(&state, &id, &claims)?;

    Ok(Json(json!({
        "status": "success",
        "data": { "message": message_response(row) }
    })))
}

/// Only the recipient flips the read flag; re-marking a read message is a
/// no-op that still reports success.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let row = state
        .db
        .get_message(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;

    if row.recipient_id != claims.sub.to_string() {
        return Err(ApiError::forbidden(
            "Only the recipient can mark a message as read",
        ));
    }

    state.db.mark_message_read(&row.id)?;

    let updated = state
        .db
        .get_message(&row.id)?
        .ok_or_else(|| anyhow::anyhow!("message {} vanished after update", row.id))?;

    Ok(Json(json!({
        "status": "success",
        "data": { "message": message_response(updated) }
    })))
}

/// Sender or recipient may delete; hard delete, no tombstone.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let row = fetch_visible(&state, &id, &claims)?;
    state.db.delete_message(&row.id)?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message deleted successfully"
    })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let count = state.db.unread_count(&claims.sub.to_string())?;

    Ok(Json(json!({
        "status": "success",
        "data": { "unread_count": count }
    })))
}

/// Loads a message and checks the caller is sender or recipient.
fn fetch_visible(state: &AppState, id: &Uuid, claims: &Claims) -> ApiResult<MessageRow> {
    let row = state
        .db
        .get_message(&id.to_string())?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;

    let caller = claims.sub.to_string();
    if row.sender_id != caller && row.recipient_id != caller {
        return Err(ApiError::forbidden("You do not have access to this message"));
    }

    Ok(row)
}

fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_uuid(&row.id, "message id"),
        sender_id: parse_uuid(&row.sender_id, "sender id"),
        recipient_id: parse_uuid(&row.recipient_id, "recipient id"),
        listing_id: parse_opt_uuid(row.listing_id.as_deref(), "listing id"),
        subject: row.subject,
        content: row.content,
        read: row.read,
        created_at: parse_utc(&row.created_at, "message created_at"),
        sender_name: row.sender_name,
        sender_email: row.sender_email,
        recipient_name: row.recipient_name,
        recipient_email: row.recipient_email,
        listing_title: row.listing_title,
    }
}
