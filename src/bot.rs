//! Bot engine: the boundary between the dispatcher and the core.
//!
//! [`BackdropBot::handle`] serializes events per user, applies the session
//! transition, performs the resulting side effects, and converts every
//! failure into a user-visible reply. Nothing it does is fatal to the
//! process or to other users' sessions.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::BackgroundCatalog;
use crate::config::GlobalConfig;
use crate::imaging::compositor::Compositor;
use crate::imaging::cutout::{CommandCutout, CutoutService};
use crate::imaging::resolver::BackgroundResolver;
use crate::imaging::storage::BackgroundStorage;
use crate::menu::{texts, MenuCommand, MenuKind};
use crate::models::action::{CaptionedImage, OutboundAction};
use crate::models::background::{BackgroundSpec, CompositeRequest};
use crate::models::event::{EventKind, InboundEvent, Photo};
use crate::models::session::Session;
use crate::session::machine::{self, Effect, PhotoRoute};
use crate::session::store::{InMemorySessionStore, SessionStore, UserLocks};
use crate::{AppError, Result};

const RESULT_FILE_NAME: &str = "result.png";

/// The conversational core.
pub struct BackdropBot {
    store: Arc<dyn SessionStore>,
    locks: UserLocks,
    catalog: Arc<BackgroundCatalog>,
    storage: BackgroundStorage,
    compositor: Arc<Compositor>,
    jobs: Arc<Semaphore>,
}

impl BackdropBot {
    /// Assemble a bot from its collaborators.
    ///
    /// `max_concurrent_jobs` bounds composite jobs across all users and is
    /// raised to one if zero.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<BackgroundCatalog>,
        storage: BackgroundStorage,
        compositor: Arc<Compositor>,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            store,
            locks: UserLocks::new(),
            catalog,
            storage,
            compositor,
            jobs: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// Build a bot with an in-memory store and the configured cutout program.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the background root cannot be prepared.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let cutout: Arc<dyn CutoutService> =
            Arc::new(CommandCutout::from_config(&config.cutout));
        Self::with_cutout(config, cutout)
    }

    /// Build a bot with an in-memory store and a caller-supplied cutout service.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the background root cannot be prepared.
    pub fn with_cutout(config: &GlobalConfig, cutout: Arc<dyn CutoutService>) -> Result<Self> {
        let storage = BackgroundStorage::new(&config.background_root)?;
        let compositor = Compositor::new(cutout, BackgroundResolver::new(config.background_fit));
        Ok(Self::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(BackgroundCatalog::from_config(config)),
            storage,
            Arc::new(compositor),
            config.max_concurrent_jobs,
        ))
    }

    /// The colour and template catalog.
    #[must_use]
    pub fn catalog(&self) -> &BackgroundCatalog {
        &self.catalog
    }

    /// Snapshot of a user's session, creating it on first contact.
    #[must_use]
    pub fn session(&self, user_id: &str) -> Session {
        self.store.get(user_id)
    }

    /// Number of sessions seen so far.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Background storage used for custom uploads.
    #[must_use]
    pub fn storage(&self) -> &BackgroundStorage {
        &self.storage
    }

    /// Handle one inbound event to completion and return what to show.
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundAction> {
        let span = info_span!("handle_event", user_id = %event.user_id, kind = event.kind.name());
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: InboundEvent) -> Vec<OutboundAction> {
        let _user = self.locks.acquire(&event.user_id).await;
        let mut session = self.store.get(&event.user_id);

        let outcome = match event.kind {
            EventKind::Text(text) => self.on_text(&mut session, &text).await,
            EventKind::Photo(photo) => self.on_photo(&mut session, photo).await,
        };

        let actions = outcome.unwrap_or_else(|err| vec![self.failure_reply(&session, &err)]);
        self.store.put(session);
        actions
    }

    async fn on_text(&self, session: &mut Session, text: &str) -> Result<Vec<OutboundAction>> {
        let command = MenuCommand::parse(text, &self.catalog);
        match machine::apply_text(session, command)? {
            Effect::Reply { message, menu } => Ok(vec![self.show_text(message, menu)]),
            Effect::ShowTemplates => {
                let mut actions = Vec::with_capacity(2);
                let previews = self.template_previews().await;
                if !previews.is_empty() {
                    actions.push(OutboundAction::ShowImages(previews));
                }
                actions.push(self.show_text(texts::CHOOSE_TEMPLATE, MenuKind::Templates));
                Ok(actions)
            }
        }
    }

    async fn on_photo(&self, session: &mut Session, photo: Photo) -> Result<Vec<OutboundAction>> {
        match machine::route_photo(session) {
            PhotoRoute::StoreBackground => {
                match self.store_background(&session.user_id, photo).await {
                    Ok(path) => {
                        machine::complete_background_upload(session, path);
                        Ok(vec![self.show_text(texts::BACKGROUND_STORED, MenuKind::Main)])
                    }
                    Err(err) => {
                        machine::abort_background_upload(session);
                        Err(err)
                    }
                }
            }
            PhotoRoute::Composite(background) => {
                let request = CompositeRequest {
                    subject: photo.bytes,
                    background,
                };
                let png = self.run_composite(request).await?;
                Ok(vec![OutboundAction::DeliverImage {
                    image: CaptionedImage {
                        file_name: RESULT_FILE_NAME.to_owned(),
                        bytes: png,
                        caption: texts::DONE.to_owned(),
                    },
                    menu: MenuKind::Main.options(&self.catalog),
                }])
            }
        }
    }

    async fn store_background(&self, user_id: &str, photo: Photo) -> Result<std::path::PathBuf> {
        let storage = self.storage.clone();
        let user_id = user_id.to_owned();
        let stored = tokio::task::spawn_blocking(move || storage.store(&user_id, &photo))
            .await
            .map_err(|err| AppError::Persistence(format!("storage task failed: {err}")))??;
        info!(
            path = %stored.path.display(),
            bytes = stored.bytes_written,
            "custom background stored"
        );
        Ok(stored.path)
    }

    /// Run a composite job on the blocking pool under the global job limit.
    async fn run_composite(&self, request: CompositeRequest) -> Result<Bytes> {
        let permit = Arc::clone(&self.jobs)
            .acquire_owned()
            .await
            .map_err(|err| AppError::Io(format!("job limiter closed: {err}")))?;
        let compositor = Arc::clone(&self.compositor);
        let job_id = Uuid::new_v4();
        let background = background_kind(&request.background);

        let output = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _span = info_span!("composite_job", %job_id, background).entered();
            compositor.composite(&request)
        })
        .await
        .map_err(|err| AppError::Cutout(format!("composite task failed: {err}")))??;

        info!(
            %job_id,
            width = output.width,
            height = output.height,
            bytes = output.png.len(),
            "composite ready"
        );
        Ok(output.png)
    }

    /// Read every template image that exists; missing ones are skipped.
    async fn template_previews(&self) -> Vec<CaptionedImage> {
        let mut previews = Vec::with_capacity(self.catalog.templates().len());
        for template in self.catalog.templates() {
            match tokio::fs::read(&template.path).await {
                Ok(bytes) => previews.push(CaptionedImage {
                    file_name: template.path.file_name().map_or_else(
                        || template.label.clone(),
                        |name| name.to_string_lossy().into_owned(),
                    ),
                    bytes: Bytes::from(bytes),
                    caption: template.label.clone(),
                }),
                Err(err) => {
                    warn!(
                        template = %template.label,
                        path = %template.path.display(),
                        %err,
                        "template preview unavailable"
                    );
                }
            }
        }
        previews
    }

    fn show_text(&self, message: impl Into<String>, menu: MenuKind) -> OutboundAction {
        OutboundAction::ShowText {
            message: message.into(),
            menu: menu.options(&self.catalog),
        }
    }

    fn failure_reply(&self, session: &Session, err: &AppError) -> OutboundAction {
        let message = match err {
            AppError::UnknownCommand(_) => {
                info!(%err, "unknown command");
                texts::UNKNOWN_COMMAND
            }
            AppError::BackgroundLoad(_) => {
                warn!(%err, "background could not be loaded");
                texts::BACKGROUND_LOAD_FAILED
            }
            AppError::Cutout(_) => {
                warn!(%err, "cutout failed");
                texts::CUTOUT_FAILED
            }
            AppError::Persistence(_) => {
                warn!(%err, "custom background rejected");
                texts::PERSISTENCE_FAILED
            }
            _ => {
                warn!(%err, "event handling failed");
                texts::INTERNAL_ERROR
            }
        };
        self.show_text(message, machine::menu_for(session.mode))
    }
}

fn background_kind(spec: &BackgroundSpec) -> &'static str {
    match spec {
        BackgroundSpec::SolidColor { .. } => "solid_color",
        BackgroundSpec::TemplateImage { .. } => "template",
        BackgroundSpec::UserImage { .. } => "user_image",
        BackgroundSpec::Default => "default",
    }
}
