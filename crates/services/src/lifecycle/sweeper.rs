use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::ChannelLifecycle;

/// Runs [`ChannelLifecycle::sweep`] every `period`, starting immediately.
pub fn spawn_sweeper(lifecycle: Arc<ChannelLifecycle>, period: Duration) -> JoinHandle<()> {
    info!(?period, "Inactive channel sweeper started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = lifecycle.sweep().await {
                error!(%e, "Channel sweep failed");
            }
        }
    })
}
