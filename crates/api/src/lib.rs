pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, patch, post},
};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    // Channel routes
    let channel_routes = Router::new()
        .route("/", get(routes::channel::list).post(routes::channel::create))
        .route("/public", get(routes::channel::explore))
        .route(
            "/{channel_id}",
            get(routes::channel::get).delete(routes::channel::delete),
        )
        .route("/{channel_id}/member", get(routes::channel::members))
        .route("/{channel_id}/join", post(routes::channel::join))
        .route("/{channel_id}/leave", post(routes::channel::leave))
        .route("/{channel_id}/invite", post(routes::channel::invite))
        .route("/{channel_id}/kick", post(routes::channel::kick))
        .route("/{channel_id}/vote-kick", post(routes::channel::vote_kick))
        .route("/{channel_id}/revoke", post(routes::channel::revoke))
        .route("/{channel_id}/unban", post(routes::channel::unban))
        .route("/{channel_id}/cancel", post(routes::channel::cancel))
        .route("/{channel_id}/clear-invite", post(routes::channel::clear_invite))
        .route(
            "/{channel_id}/message",
            get(routes::message::list).post(routes::message::create),
        );

    // Direct message routes
    let dm_routes = Router::new()
        .route(
            "/",
            get(routes::direct_message::list).post(routes::direct_message::open),
        )
        .route(
            "/{dm_id}/message",
            get(routes::direct_message::messages).post(routes::direct_message::send),
        );

    // User routes
    let user_routes = Router::new()
        .route("/status", patch(routes::user::update_status))
        .route("/search", get(routes::user::search))
        .route("/{user_id}", get(routes::user::get));

    // Compose API
    let api = Router::new()
        .nest("/channel", channel_routes)
        .nest("/dm", dm_routes)
        .nest("/user", user_routes)
        .route("/message/{message_id}", delete(routes::message::delete))
        .route("/typing", post(routes::typing::update));

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Any origin when none are configured, otherwise the configured list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
