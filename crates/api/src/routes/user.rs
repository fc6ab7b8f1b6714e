use axum::{
    Json,
    extract::{Path, Query, State},
};
use huddle_db::models::UserStatus;
use serde::Deserialize;

use crate::{
    error::{ApiError, parse_id},
    extractors::auth::AuthUser,
    state::AppState,
};
use huddle_services::realtime::event::UserSummary;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserSummary>, ApiError> {
    let uid = parse_id(&user_id, "user_id")?;
    let user = state.chat.get_user(uid).await?;
    Ok(Json(UserSummary::from(&user)))
}

pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.chat.search_users(&query.q, query.limit).await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<StatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.chat.set_user_status(auth.user_id, body.status).await?;
    Ok(Json(serde_json::json!({ "status": body.status })))
}
