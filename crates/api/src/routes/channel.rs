use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::AuthUser,
    state::AppState,
};
use huddle_services::chat::KickOutcome;
use huddle_services::moderation::VoteOutcome;
use huddle_services::realtime::event::{ChannelSummary, MemberSummary};

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default, rename = "isPrivate")]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChannelSummary>>, ApiError> {
    Ok(Json(state.chat.list_user_channels(auth.user_id).await?))
}

pub async fn explore(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ChannelSummary>>, ApiError> {
    let channels = state.chat.list_public_channels().await?;
    Ok(Json(channels.iter().map(ChannelSummary::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateChannelRequest>,
) -> Result<Json<ChannelSummary>, ApiError> {
    let channel = state
        .chat
        .create_channel(auth.user_id, &body.name, body.description, body.is_private)
        .await?;
    Ok(Json(ChannelSummary::from(&channel)))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelSummary>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let channel = state.chat.get_channel(cid, auth.user_id).await?;
    Ok(Json(ChannelSummary::from(&channel)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    state.chat.delete_channel(cid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<Vec<MemberSummary>>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    Ok(Json(state.chat.list_members(cid, auth.user_id).await?))
}

pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    state.chat.join_channel(cid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "joined": true })))
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    state.chat.leave_channel(cid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "left": true })))
}

pub async fn invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let target = parse_id(&body.user_id, "userId")?;
    state.chat.invite_user(cid, auth.user_id, target).await?;
    Ok(Json(serde_json::json!({ "invited": true })))
}

pub async fn kick(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<KickOutcome>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let target = parse_id(&body.user_id, "userId")?;
    Ok(Json(state.chat.kick_user(cid, auth.user_id, target).await?))
}

pub async fn vote_kick(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<VoteOutcome>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let target = parse_id(&body.user_id, "userId")?;
    Ok(Json(state.chat.vote_kick(cid, auth.user_id, target).await?))
}

pub async fn revoke(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let target = parse_id(&body.user_id, "userId")?;
    state.chat.revoke_user(cid, auth.user_id, target).await?;
    Ok(Json(serde_json::json!({ "revoked": true })))
}

pub async fn unban(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
    Json(body): Json<TargetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let target = parse_id(&body.user_id, "userId")?;
    state.chat.unban_user(cid, auth.user_id, target).await?;
    Ok(Json(serde_json::json!({ "unbanned": true })))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    let outcome = state.chat.cancel_channel(cid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "outcome": outcome })))
}

pub async fn clear_invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(channel_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&channel_id, "channel_id")?;
    state.chat.clear_invite_flag(cid, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
