//! Per-user inbound event queues.
//!
//! Socket Mode envelopes are acknowledged only after the callback returns,
//! so callbacks must not wait for the bot. Each user gets a FIFO drained by
//! one worker task: a user's events are handled in arrival order while
//! different users proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use slack_morphism::prelude::{SlackChannelId, SlackFile};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::menu::{texts, MenuKind};
use crate::models::action::OutboundAction;
use crate::models::event::InboundEvent;
use crate::slack::events;

/// Events a single user may have waiting before new ones are dropped.
const USER_QUEUE_CAPACITY: usize = 32;

/// An inbound item waiting for its user's worker.
#[derive(Debug, Clone)]
pub enum Pending {
    /// A ready-to-handle event.
    Event(InboundEvent),
    /// A shared file still to be downloaded.
    SharedFile {
        /// Sender of the file.
        user_id: String,
        /// File metadata from the message event.
        file: SlackFile,
    },
}

impl Pending {
    fn user_id(&self) -> &str {
        match self {
            Self::Event(event) => &event.user_id,
            Self::SharedFile { user_id, .. } => user_id,
        }
    }
}

type Job = (SlackChannelId, Pending);

/// Registry of per-user queues.
#[derive(Debug, Default)]
pub struct UserInbox {
    queues: Mutex<HashMap<String, mpsc::Sender<Job>>>,
}

impl UserInbox {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Queue `pending` for its user and return without waiting for it to be
/// handled.
pub fn enqueue(app: &Arc<AppState>, channel: SlackChannelId, pending: Pending) {
    let user_id = pending.user_id().to_owned();
    let mut queues = app
        .inbox
        .queues
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let mut job = (channel, pending);
    if let Some(queue) = queues.get(&user_id) {
        match queue.try_send(job) {
            Ok(()) => return,
            Err(TrySendError::Full(_)) => {
                warn!(user_id, "user queue full; dropping event");
                return;
            }
            Err(TrySendError::Closed(returned)) => job = returned,
        }
    }

    let (queue, rx) = mpsc::channel(USER_QUEUE_CAPACITY);
    if queue.try_send(job).is_err() {
        warn!(user_id, "fresh user queue rejected event");
        return;
    }
    queues.insert(user_id.clone(), queue);
    spawn_worker(user_id, Arc::downgrade(app), rx);
}

/// Drain one user's queue until the app state is gone.
fn spawn_worker(user_id: String, app: Weak<AppState>, mut rx: mpsc::Receiver<Job>) {
    tokio::spawn(async move {
        while let Some((channel, pending)) = rx.recv().await {
            let Some(app) = app.upgrade() else {
                break;
            };
            let event = match pending {
                Pending::Event(event) => event,
                Pending::SharedFile { user_id, file } => {
                    match events::download_photo(&file, &app).await {
                        Ok(photo) => InboundEvent::photo(user_id, photo),
                        Err(err) => {
                            warn!(%err, user_id, "failed to download shared file");
                            let menu = MenuKind::Main.options(app.bot.catalog());
                            let reply = OutboundAction::ShowText {
                                message: texts::INTERNAL_ERROR.to_owned(),
                                menu,
                            };
                            events::deliver(&app, &channel, vec![reply]).await;
                            continue;
                        }
                    }
                }
            };
            let actions = app.bot.handle(event).await;
            events::deliver(&app, &channel, actions).await;
        }
        debug!(user_id, "user queue worker exiting");
    });
}
