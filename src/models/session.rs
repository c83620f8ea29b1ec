//! Session model and selection helpers.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque RGB colour triple.
///
/// Serialized as a three-element array (`[255, 0, 0]`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Opaque white, the default background.
    pub const WHITE: Self = Self(255, 255, 255);

    /// Channel values as an array.
    #[must_use]
    pub const fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Menu mode governing how the next text or photo input is interpreted.
///
/// `Idle` is the main menu.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Main menu; photos are processed against the current selection.
    #[default]
    Idle,
    /// Picking between template, colour, or custom upload.
    ChoosingBackgroundMethod,
    /// Picking one of the preset templates.
    ChoosingTemplate,
    /// Picking one of the palette colours.
    ChoosingColor,
    /// The next photo is stored as the user's custom background.
    WaitingForBackground,
}

/// An image-backed background selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackgroundChoice {
    /// A preset template, identified by its label.
    Template {
        /// Template label as shown in the menu.
        label: String,
        /// Image file under the templates root.
        path: PathBuf,
    },
    /// A background photo previously uploaded by this user.
    Uploaded {
        /// Stored file under the background root.
        path: PathBuf,
    },
}

/// Per-user interaction record.
///
/// At most one of `background` and `color` is set; the setters enforce this
/// by clearing the other field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    /// Stable external user identifier.
    pub user_id: String,
    /// Current menu mode.
    pub mode: SessionMode,
    background: Option<BackgroundChoice>,
    color: Option<Rgb>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Construct a fresh session in the main menu with no selection.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            mode: SessionMode::Idle,
            background: None,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Currently selected image background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&BackgroundChoice> {
        self.background.as_ref()
    }

    /// Currently selected solid colour, if any.
    #[must_use]
    pub fn color(&self) -> Option<Rgb> {
        self.color
    }

    /// Select a solid colour and drop any image background.
    pub fn set_color(&mut self, color: Rgb) {
        self.color = Some(color);
        self.background = None;
        self.touch();
    }

    /// Select an image background and drop any solid colour.
    pub fn set_background(&mut self, background: BackgroundChoice) {
        self.background = Some(background);
        self.color = None;
        self.touch();
    }

    /// Move to another menu mode.
    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
        self.touch();
    }

    /// Return to the main menu and forget any selection.
    pub fn reset(&mut self) {
        self.mode = SessionMode::Idle;
        self.background = None;
        self.color = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
