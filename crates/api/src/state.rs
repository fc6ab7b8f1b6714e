use huddle_config::Settings;
use huddle_services::{AuthService, ChatService, ChatStore, realtime::SubscriptionRegistry};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(store: Arc<dyn ChatStore>, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let registry = Arc::new(SubscriptionRegistry::new());
        let chat = Arc::new(ChatService::new(store, registry, settings.channels.clone()));

        Self {
            settings,
            auth,
            chat,
        }
    }
}
