//! Slack Socket Mode client with an ordered, buffered delivery queue.
//!
//! Text messages and file uploads share one queue so a user sees replies in
//! the order the bot produced them.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiFilesComplete,
    SlackApiFilesCompleteUploadExternalRequest, SlackApiFilesGetUploadUrlExternalRequest,
    SlackApiToken, SlackApiTokenType, SlackApiTokenValue, SlackBlock, SlackChannelId, SlackClient,
    SlackClientEventsListenerEnvironment, SlackClientHyperHttpsConnector, SlackClientSession,
    SlackClientSocketModeConfig, SlackClientSocketModeListener, SlackMessageContent,
    SlackSocketModeListenerCallbacks,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::app::AppState;
use crate::bot::BackdropBot;
use crate::config::GlobalConfig;
use crate::slack::events;
use crate::slack::inbox::UserInbox;
use crate::{AppError, Result};

const QUEUE_CAPACITY: usize = 256;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 5;

/// Message to be delivered via chat.postMessage.
#[derive(Debug, Clone)]
pub struct SlackMessage {
    pub channel: SlackChannelId,
    pub text: Option<String>,
    pub blocks: Option<Vec<SlackBlock>>,
}

impl SlackMessage {
    fn to_request(&self) -> SlackApiChatPostMessageRequest {
        let content = SlackMessageContent {
            text: self.text.clone(),
            markdown_text: None,
            blocks: self.blocks.clone(),
            attachments: None,
            upload: None,
            files: None,
            reactions: None,
            metadata: None,
        };

        SlackApiChatPostMessageRequest {
            channel: self.channel.clone(),
            content,
            as_user: None,
            icon_emoji: None,
            icon_url: None,
            link_names: Some(true),
            parse: None,
            thread_ts: None,
            username: None,
            reply_broadcast: None,
            unfurl_links: None,
            unfurl_media: None,
        }
    }
}

/// File to be uploaded via the external upload flow.
#[derive(Debug, Clone)]
pub struct SlackUpload {
    pub channel: SlackChannelId,
    pub file_name: String,
    pub bytes: Bytes,
    pub caption: Option<String>,
}

/// One queued delivery.
#[derive(Debug, Clone)]
pub enum Outgoing {
    Message(SlackMessage),
    File(SlackUpload),
}

/// Slack Socket Mode wrapper that owns the outgoing queue.
///
/// Dropping the service (and the listener holding the shared state) closes
/// the queue, letting the sender task drain and exit.
pub struct SlackService {
    outbox: mpsc::Sender<Outgoing>,
}

/// Join handles for Slack background tasks.
pub struct SlackRuntime {
    pub queue_task: JoinHandle<()>,
    pub socket_task: JoinHandle<()>,
}

impl SlackService {
    /// Start the sender task and the Socket Mode listener routing events to `bot`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn start(config: Arc<GlobalConfig>, bot: Arc<BackdropBot>) -> Result<(Self, SlackRuntime)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.slack.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };
        let app_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.slack.app_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::App),
        };

        let http = reqwest::Client::new();
        let (outbox, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(Arc::clone(&client), bot_token, http.clone(), queue_rx);

        let state = Arc::new(AppState {
            config,
            bot,
            outbox: outbox.clone(),
            http,
            inbox: UserInbox::new(),
        });
        let socket_task = Self::spawn_socket_mode(&client, app_token, state);

        info!("slack service started with buffered queue and socket mode");

        Ok((
            Self { outbox },
            SlackRuntime {
                queue_task,
                socket_task,
            },
        ))
    }

    /// Stop the Socket Mode listener and wait up to `timeout` for queued
    /// deliveries to go out.
    pub async fn shutdown(self, runtime: SlackRuntime, timeout: Duration) {
        runtime.socket_task.abort();
        drop(self.outbox);
        if tokio::time::timeout(timeout, runtime.queue_task)
            .await
            .is_err()
        {
            warn!("slack queue did not drain before timeout");
        }
    }

    fn spawn_worker(
        client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        token: SlackApiToken,
        http: reqwest::Client,
        mut queue_rx: mpsc::Receiver<Outgoing>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            while let Some(item) = queue_rx.recv().await {
                let mut backoff = INITIAL_RETRY_DELAY;
                let mut attempt = 1;
                loop {
                    let delay = match &item {
                        Outgoing::Message(message) => {
                            match session.chat_post_message(&message.to_request()).await {
                                Ok(_) => None,
                                Err(slack_morphism::errors::SlackClientError::RateLimitError(
                                    rate,
                                )) => Some(rate.retry_after.unwrap_or(backoff)),
                                Err(err) => {
                                    warn!(?err, "slack post failed");
                                    Some(backoff)
                                }
                            }
                        }
                        Outgoing::File(upload) => match upload_file(&session, &http, upload).await
                        {
                            Ok(()) => None,
                            Err(err) => {
                                warn!(%err, file = upload.file_name, "slack upload failed");
                                Some(backoff)
                            }
                        },
                    };

                    let Some(delay) = delay else {
                        info!("delivered slack item");
                        break;
                    };
                    if attempt >= MAX_ATTEMPTS {
                        error!(attempt, "giving up on slack delivery");
                        break;
                    }
                    warn!(attempt, delay = ?delay, "retrying slack delivery");
                    sleep(delay).await;
                    backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                    attempt += 1;
                }
            }
            info!("slack sender task exiting");
        })
    }

    fn spawn_socket_mode(
        client: &Arc<SlackClient<SlackClientHyperHttpsConnector>>,
        app_token: SlackApiToken,
        state: Arc<AppState>,
    ) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR
                })
                .with_user_state(state),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_interaction_events(events::handle_interaction)
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            listener.serve().await;
            info!("socket mode listener exited");
        })
    }
}

/// Upload a file to a channel using the external upload flow.
async fn upload_file(
    session: &SlackClientSession<'_, SlackClientHyperHttpsConnector>,
    http: &reqwest::Client,
    upload: &SlackUpload,
) -> Result<()> {
    let url_request =
        SlackApiFilesGetUploadUrlExternalRequest::new(upload.file_name.clone(), upload.bytes.len());
    let url_response = session
        .get_upload_url_external(&url_request)
        .await
        .map_err(|err| AppError::Slack(format!("failed to get upload url: {err}")))?;

    http.post(url_response.upload_url.0.to_string())
        .body(upload.bytes.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| AppError::Slack(format!("failed to upload file: {err}")))?;

    let file_ref = SlackApiFilesComplete {
        id: url_response.file_id,
        title: Some(upload.file_name.clone()),
    };
    let mut complete_request = SlackApiFilesCompleteUploadExternalRequest::new(vec![file_ref]);
    complete_request.channel_id = Some(upload.channel.clone());
    complete_request.initial_comment.clone_from(&upload.caption);
    session
        .files_complete_upload_external(&complete_request)
        .await
        .map_err(|err| AppError::Slack(format!("failed to complete upload: {err}")))?;

    Ok(())
}
