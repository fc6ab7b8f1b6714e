use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::AuthUser,
    state::AppState,
};
use huddle_services::dao::base::{PaginatedResult, PaginationParams};
use huddle_services::realtime::event::MessagePayload;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<MessagePayload>>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let params = PaginationParams::new(params.page, params.per_page);
    let page = state
        .chat
        .list_channel_messages(cid, auth.user_id, &params)
        .await?;
    Ok(Json(page))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<MessagePayload>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let message = state
        .chat
        .send_channel_message(cid, auth.user_id, &body.content)
        .await?;
    let author = state.chat.get_user(auth.user_id).await?;
    Ok(Json(MessagePayload::new(&message, &author)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mid = parse_id(&message_id, "message_id")?;
    state.chat.delete_message(mid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
