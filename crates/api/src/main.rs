use std::sync::Arc;

use huddle_api::{build_router, state::AppState};
use huddle_config::{DatabaseBackend, ExpiryMode, Settings};
use huddle_db::{connect, indexes::ensure_indexes};
use huddle_services::{ChatStore, MemoryStore, MongoStore, lifecycle::spawn_sweeper};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "huddle_api=debug,huddle_services=debug,huddle_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!("Starting Huddle API on {}:{}", settings.app.host, settings.app.port);
    info!(
        backend = ?settings.database.backend,
        expiry_mode = ?settings.channels.expiry_mode,
        inactivity_threshold_secs = settings.channels.inactivity_threshold_secs,
        kick_vote_quorum = settings.channels.kick_vote_quorum,
        "Channel config"
    );

    let store: Arc<dyn ChatStore> = match settings.database.backend {
        DatabaseBackend::Memory => Arc::new(MemoryStore::new()),
        DatabaseBackend::Mongo => {
            let db = connect(&settings).await?;
            ensure_indexes(&db).await?;
            Arc::new(MongoStore::new(&db))
        }
    };

    let app_state = AppState::new(store, settings.clone());

    // Expiry: periodic sweep, or per-channel timers re-armed from persisted activity
    let lifecycle = app_state.chat.lifecycle().clone();
    match settings.channels.expiry_mode {
        ExpiryMode::Sweep => {
            spawn_sweeper(lifecycle, settings.channels.sweep_interval());
        }
        ExpiryMode::Timer => {
            let armed = lifecycle.rearm_all().await?;
            info!(armed, "Expiry timers armed");
        }
    }

    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
