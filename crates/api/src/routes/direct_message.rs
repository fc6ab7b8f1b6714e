use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::AuthUser,
    routes::message::SendMessageRequest,
    state::AppState,
};
use huddle_services::chat::ConversationSummary;
use huddle_services::dao::base::{PaginatedResult, PaginationParams};
use huddle_services::realtime::event::MessagePayload;

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    #[serde(rename = "user1Id")]
    pub user1_id: String,
    #[serde(rename = "user2Id")]
    pub user2_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(state.chat.list_direct_messages(auth.user_id).await?))
}

pub async fn open(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<OpenConversationRequest>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let other = parse_id(&body.user_id, "userId")?;
    let dm = state.chat.open_direct_message(auth.user_id, other).await?;
    Ok(Json(ConversationResponse {
        id: dm.id.to_hex(),
        user1_id: dm.user1_id.to_hex(),
        user2_id: dm.user2_id.to_hex(),
    }))
}

pub async fn messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dm_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<MessagePayload>>, ApiError> {
    let did = parse_id(&dm_id, "direct_message_id")?;
    let params = PaginationParams::new(params.page, params.per_page);
    Ok(Json(state.chat.list_dm_messages(did, auth.user_id, &params).await?))
}

pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(dm_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<MessagePayload>, ApiError> {
    let did = parse_id(&dm_id, "direct_message_id")?;
    let message = state
        .chat
        .send_direct_message(did, auth.user_id, &body.content)
        .await?;
    let author = state.chat.get_user(auth.user_id).await?;
    Ok(Json(MessagePayload::new(&message, &author)))
}
