use axum::{Json, extract::State};
use serde::Deserialize;

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::AuthUser,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub channel_id: String,
    pub is_typing: bool,
    pub text: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<TypingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cid = parse_id(&body.channel_id, "channelId")?;
    state
        .chat
        .set_typing(cid, auth.user_id, body.is_typing, body.text)
        .await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
