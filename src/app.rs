//! Shared state handed to the Slack event callbacks.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::bot::BackdropBot;
use crate::config::GlobalConfig;
use crate::slack::client::Outgoing;
use crate::slack::inbox::UserInbox;

/// State injected into the Socket Mode listener.
pub struct AppState {
    /// Validated configuration, including loaded credentials.
    pub config: Arc<GlobalConfig>,
    /// Conversational core.
    pub bot: Arc<BackdropBot>,
    /// Ordered delivery queue drained by the Slack sender task.
    pub outbox: mpsc::Sender<Outgoing>,
    /// HTTP client used to download shared files.
    pub http: reqwest::Client,
    /// Per-user FIFOs feeding the bot.
    pub inbox: UserInbox,
}
