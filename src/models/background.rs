//! Resolved description of what to paint behind a cutout.

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::session::{BackgroundChoice, Rgb, Session};

/// What the compositor paints behind the subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackgroundSpec {
    /// Fill with a single colour.
    SolidColor {
        /// Fill colour.
        color: Rgb,
    },
    /// One of the preset template images.
    TemplateImage {
        /// Template image file.
        path: PathBuf,
    },
    /// A background uploaded earlier by the same user.
    UserImage {
        /// Stored background file.
        path: PathBuf,
    },
    /// Opaque white.
    Default,
}

impl BackgroundSpec {
    /// Derive the active spec for a session.
    ///
    /// Precedence is colour, then image background, then [`BackgroundSpec::Default`].
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        if let Some(color) = session.color() {
            return Self::SolidColor { color };
        }
        match session.background() {
            Some(BackgroundChoice::Template { path, .. }) => {
                Self::TemplateImage { path: path.clone() }
            }
            Some(BackgroundChoice::Uploaded { path }) => Self::UserImage { path: path.clone() },
            None => Self::Default,
        }
    }
}

/// A subject photo paired with the background it should be composited onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeRequest {
    /// Raw, still-encoded subject photo.
    pub subject: Bytes,
    /// Background to paint behind the cutout.
    pub background: BackgroundSpec,
}
