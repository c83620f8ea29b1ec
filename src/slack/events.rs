//! Slack event dispatch.
//!
//! Translates direct messages, file shares and menu button presses into
//! [`InboundEvent`]s and hands them to the per-user [`inbox`], so callbacks
//! return before the bot runs. The worker queues the resulting actions for
//! delivery back to the originating channel.
//!
//! When `authorized_user_ids` is configured, events from other users are
//! dropped without a reply and logged as security events.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use slack_morphism::prelude::{
    SlackChannelId, SlackClient, SlackClientEventsUserState, SlackClientHyperHttpsConnector,
    SlackEventCallbackBody, SlackFile, SlackInteractionEvent, SlackMessageEvent,
    SlackPushEventCallback,
};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::menu::texts;
use crate::models::action::OutboundAction;
use crate::models::event::{InboundEvent, Photo};
use crate::slack::blocks::{self, MENU_ACTION_PREFIX};
use crate::slack::client::{Outgoing, SlackMessage, SlackUpload};
use crate::slack::inbox::{self, Pending};
use crate::{AppError, Result};

async fn app_state(state: &SlackClientEventsUserState) -> Option<Arc<AppState>> {
    let guard = state.read().await;
    guard.get_user_state::<Arc<AppState>>().cloned()
}

fn is_authorized(user_id: &str, app: &AppState) -> bool {
    match app.config.ensure_authorized(user_id) {
        Ok(()) => true,
        Err(err) => {
            warn!(%err, user_id, "event from unauthorized user silently ignored");
            false
        }
    }
}

/// Handle push events (messages and file shares) delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; per-event problems are logged and answered in the channel.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let Some(app) = app_state(&state).await else {
        warn!("app state not available; cannot process push event");
        return Ok(());
    };

    match event.event {
        SlackEventCallbackBody::Message(message) => handle_message(message, &app),
        other => debug!(?other, "push event ignored"),
    }
    Ok(())
}

fn handle_message(message: SlackMessageEvent, app: &Arc<AppState>) {
    // Bot messages include our own replies.
    if message.sender.bot_id.is_some() {
        return;
    }
    let (Some(user), Some(channel)) = (message.sender.user, message.origin.channel) else {
        return;
    };
    let user_id = user.to_string();
    if !is_authorized(&user_id, app) {
        return;
    }

    let Some(content) = message.content else {
        return;
    };
    let first_file = content.files.and_then(|files| files.into_iter().next());

    let pending = if let Some(file) = first_file {
        Pending::SharedFile { user_id, file }
    } else {
        match content.text {
            Some(text) if !text.trim().is_empty() => {
                Pending::Event(InboundEvent::text(user_id, text))
            }
            _ => return,
        }
    };

    inbox::enqueue(app, channel, pending);
}

/// Handle interactive payloads (menu buttons) delivered via Socket Mode.
///
/// # Errors
///
/// Never fails; unknown interactions are logged and ignored.
pub async fn handle_interaction(
    event: SlackInteractionEvent,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let Some(app) = app_state(&state).await else {
        warn!("app state not available; cannot process interaction");
        return Ok(());
    };

    match &event {
        SlackInteractionEvent::BlockActions(block_event) => {
            let user_id = block_event
                .user
                .as_ref()
                .map(|u| u.id.to_string())
                .unwrap_or_default();

            if user_id.is_empty() {
                warn!("block action with empty user ID; ignoring");
                return Ok(());
            }
            if !is_authorized(&user_id, &app) {
                return Ok(());
            }
            let Some(channel) = block_event.channel.as_ref().map(|c| c.id.clone()) else {
                warn!(user_id, "block action without channel; ignoring");
                return Ok(());
            };

            for action in block_event.actions.iter().flatten() {
                let action_id = action.action_id.to_string();
                if !action_id.starts_with(MENU_ACTION_PREFIX) {
                    warn!(action_id, "unknown action_id prefix");
                    continue;
                }
                let Some(label) = action.value.clone() else {
                    warn!(action_id, "menu action missing label value");
                    continue;
                };
                info!(action_id, user_id, "queueing menu action");
                inbox::enqueue(
                    &app,
                    channel.clone(),
                    Pending::Event(InboundEvent::text(user_id.clone(), label)),
                );
            }
        }
        _ => {
            debug!(?event, "unhandled interaction event type");
        }
    }
    Ok(())
}

/// Queue `actions` for delivery to `channel`, preserving their order.
pub async fn deliver(app: &AppState, channel: &SlackChannelId, actions: Vec<OutboundAction>) {
    for item in actions.into_iter().flat_map(|action| to_outgoing(channel, action)) {
        if let Err(err) = app.outbox.send(item).await {
            warn!(%err, "slack delivery queue closed");
            return;
        }
    }
}

/// Map one action onto the Slack deliveries that render it.
#[must_use]
pub fn to_outgoing(channel: &SlackChannelId, action: OutboundAction) -> Vec<Outgoing> {
    match action {
        OutboundAction::ShowText { message, menu } => vec![Outgoing::Message(SlackMessage {
            channel: channel.clone(),
            blocks: Some(blocks::menu_message(&message, &menu)),
            text: Some(message),
        })],
        OutboundAction::ShowImages(images) => images
            .into_iter()
            .map(|image| {
                Outgoing::File(SlackUpload {
                    channel: channel.clone(),
                    file_name: image.file_name,
                    bytes: image.bytes,
                    caption: Some(image.caption),
                })
            })
            .collect(),
        OutboundAction::DeliverImage { image, menu } => {
            let mut items = vec![Outgoing::File(SlackUpload {
                channel: channel.clone(),
                file_name: image.file_name,
                bytes: image.bytes,
                caption: Some(image.caption),
            })];
            // The caption already went out with the upload.
            if !menu.is_empty() {
                items.push(Outgoing::Message(SlackMessage {
                    channel: channel.clone(),
                    text: Some(texts::NEXT_STEP.to_owned()),
                    blocks: Some(blocks::menu_message(texts::NEXT_STEP, &menu)),
                }));
            }
            items
        }
    }
}

/// Download a shared file with the bot token.
pub(crate) async fn download_photo(file: &SlackFile, app: &AppState) -> Result<Photo> {
    let url = file
        .url_private_download
        .as_ref()
        .or(file.url_private.as_ref())
        .ok_or_else(|| AppError::Slack("shared file has no download url".into()))?;

    let bytes: Bytes = app
        .http
        .get(url.as_str())
        .bearer_auth(&app.config.slack.bot_token)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| AppError::Slack(format!("file download failed: {err}")))?
        .bytes()
        .await
        .map_err(|err| AppError::Slack(format!("file download interrupted: {err}")))?;

    let format_hint = file
        .name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);

    Ok(Photo::new(bytes, format_hint))
}
