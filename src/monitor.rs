//! Periodic usage report.
//!
//! Sessions and stored backgrounds are never evicted, so their counts are
//! logged on a fixed interval to make growth visible.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bot::BackdropBot;

/// Default interval between usage reports.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the usage report background task.
#[must_use]
pub fn spawn_usage_task(
    bot: Arc<BackdropBot>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("usage task shutting down");
                    break;
                }
                _ = ticker.tick() => report(&bot),
            }
        }
    })
}

fn report(bot: &BackdropBot) {
    match bot.storage().count() {
        Ok(backgrounds) => info!(
            sessions = bot.session_count(),
            backgrounds,
            "usage report"
        ),
        Err(err) => warn!(%err, sessions = bot.session_count(), "usage report incomplete"),
    }
}
