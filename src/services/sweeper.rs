use log::{debug, error, info};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::identity::IdentityService;

/// Periodically deletes expired and long-revoked refresh tokens. Never returns.
pub async fn run(identity: IdentityService, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match identity.purge_expired_tokens().await {
            Ok(0) => debug!("token sweep: nothing to delete"),
            Ok(count) => info!("token sweep: deleted {} refresh tokens", count),
            Err(e) => error!("token sweep failed: {}", e),
        }
    }
}
