//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// File-system or I/O operation failure.
    Io(String),
    /// Text input matched no label valid in the current mode.
    UnknownCommand(String),
    /// Template or uploaded background missing, corrupt or unreadable.
    BackgroundLoad(String),
    /// Background removal failed or rejected the photo.
    Cutout(String),
    /// Uploaded background could not be validated or written to storage.
    Persistence(String),
    /// Composited image could not be encoded.
    Encode(String),
    /// Caller is not authorized to use the bot.
    Unauthorized(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::UnknownCommand(msg) => write!(f, "unknown command: {msg}"),
            Self::BackgroundLoad(msg) => write!(f, "background load: {msg}"),
            Self::Cutout(msg) => write!(f, "cutout: {msg}"),
            Self::Persistence(msg) => write!(f, "persistence: {msg}"),
            Self::Encode(msg) => write!(f, "encode: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
