//! Global configuration parsing, validation, and credential loading.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::menu;
use crate::models::session::Rgb;
use crate::{AppError, Result};

const KEYRING_SERVICE: &str = "backdrop-bot";

/// Slack Socket Mode credentials.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// never from the TOML config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// External background-removal program.
///
/// `{input}` and `{output}` in `args` are replaced with temporary file paths
/// holding the subject photo and receiving the PNG cutout.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CutoutConfig {
    /// Program to execute.
    pub program: String,
    /// Argument template.
    #[serde(default = "default_cutout_args")]
    pub args: Vec<String>,
}

fn default_cutout_args() -> Vec<String> {
    vec!["i".into(), "{input}".into(), "{output}".into()]
}

/// How template and uploaded backgrounds are fitted to the cutout size.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundFit {
    /// Resize exactly to the target size, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Preserve aspect ratio, scale to cover, and centre-crop.
    Cover,
}

/// A named palette colour.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ColorEntry {
    /// Menu label.
    pub label: String,
    /// Fill colour as `[r, g, b]`.
    pub rgb: Rgb,
}

/// A named preset template image.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TemplateEntry {
    /// Menu label.
    pub label: String,
    /// File name relative to `templates_root`.
    pub file: PathBuf,
}

fn default_max_concurrent_jobs() -> usize {
    2
}

fn default_colors() -> Vec<ColorEntry> {
    [
        ("White", Rgb(255, 255, 255)),
        ("Black", Rgb(0, 0, 0)),
        ("Red", Rgb(255, 0, 0)),
        ("Green", Rgb(0, 255, 0)),
        ("Blue", Rgb(0, 0, 255)),
    ]
    .into_iter()
    .map(|(label, rgb)| ColorEntry {
        label: label.into(),
        rgb,
    })
    .collect()
}

fn default_templates() -> Vec<TemplateEntry> {
    [
        ("Landscape", "landscape.jpg"),
        ("Gradient", "gradient.jpg"),
        ("Abstract", "abstract.jpg"),
    ]
    .into_iter()
    .map(|(label, file)| TemplateEntry {
        label: label.into(),
        file: file.into(),
    })
    .collect()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Directory receiving user-uploaded backgrounds.
    pub background_root: PathBuf,
    /// Directory holding the preset template images.
    pub templates_root: PathBuf,
    /// Maximum composite jobs running at once across all users.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Fitting strategy for image backgrounds.
    #[serde(default)]
    pub background_fit: BackgroundFit,
    /// Slack user IDs allowed to use the bot; empty allows everyone.
    #[serde(default)]
    pub authorized_user_ids: Vec<String>,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// Background-removal program.
    pub cutout: CutoutConfig,
    /// Fixed colour palette, in menu order.
    #[serde(default = "default_colors")]
    pub colors: Vec<ColorEntry>,
    /// Preset templates, in menu order.
    #[serde(default = "default_templates")]
    pub templates: Vec<TemplateEntry>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `backdrop-bot` keyring service first, then falls back to
    /// `SLACK_APP_TOKEN` / `SLACK_BOT_TOKEN` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required tokens.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        Ok(())
    }

    /// Whether a user may talk to the bot.
    #[must_use]
    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized_user_ids.is_empty() || self.authorized_user_ids.iter().any(|id| id == user_id)
    }

    /// Validate that a user may talk to the bot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if an allow-list is configured and
    /// the user is not on it.
    pub fn ensure_authorized(&self, user_id: &str) -> Result<()> {
        if self.is_authorized(user_id) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("user is not authorized".into()))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrent_jobs == 0 {
            return Err(AppError::Config(
                "max_concurrent_jobs must be greater than zero".into(),
            ));
        }

        if self.cutout.program.trim().is_empty() {
            return Err(AppError::Config("cutout.program must not be empty".into()));
        }

        let labels = self
            .colors
            .iter()
            .map(|entry| entry.label.as_str())
            .chain(self.templates.iter().map(|entry| entry.label.as_str()));
        let mut seen = HashSet::new();
        for label in labels {
            let key = menu::normalize(label);
            if key.is_empty() {
                return Err(AppError::Config("palette and template labels must not be empty".into()));
            }
            if menu::is_reserved(label) {
                return Err(AppError::Config(format!(
                    "label {label:?} collides with a menu label"
                )));
            }
            if !seen.insert(key) {
                return Err(AppError::Config(format!("duplicate label {label:?}")));
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
