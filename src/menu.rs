//! Menu labels, label parsing, and user-facing texts.
//!
//! Raw text from the transport is parsed once into a [`MenuCommand`]; the
//! state machine only ever sees the tagged variant.

use std::path::PathBuf;

use crate::catalog::BackgroundCatalog;
use crate::models::session::Rgb;

/// Command that resets the session.
pub const START: &str = "/start";
/// Opens the main menu.
pub const BEGIN: &str = "Begin";
/// Shows the instructions.
pub const HELP: &str = "Help";
/// Opens the background method sub-menu.
pub const CHOOSE_BACKGROUND: &str = "Choose background";
/// Picks the template method.
pub const TEMPLATE: &str = "Template";
/// Picks the solid colour method.
pub const COLOR: &str = "Color";
/// Picks the custom upload method.
pub const CUSTOM_BACKGROUND: &str = "Custom background";
/// Returns to the main menu.
pub const BACK: &str = "Back";

const START_ALIAS: &str = "start";
const BACK_ALIAS: &str = "\u{2b05}\u{fe0f} Back";

const RESERVED: [&str; 10] = [
    START,
    START_ALIAS,
    BEGIN,
    HELP,
    CHOOSE_BACKGROUND,
    TEMPLATE,
    COLOR,
    CUSTOM_BACKGROUND,
    BACK,
    BACK_ALIAS,
];

/// Canonical form used for label comparison.
#[must_use]
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Whether `label` is one of the fixed menu labels.
#[must_use]
pub fn is_reserved(label: &str) -> bool {
    let key = normalize(label);
    RESERVED.iter().any(|reserved| normalize(reserved) == key)
}

/// A parsed text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    /// Reset the session.
    Start,
    /// Open the main menu.
    Begin,
    /// Show instructions.
    Help,
    /// Open the background method sub-menu.
    ChooseBackground,
    /// Choose from the preset templates.
    Template,
    /// Choose from the palette.
    Color,
    /// Upload a custom background.
    CustomBackground,
    /// Return to the main menu.
    Back,
    /// A palette colour label.
    PickColor {
        /// Label as configured.
        label: String,
        /// Colour it maps to.
        rgb: Rgb,
    },
    /// A template label.
    PickTemplate {
        /// Label as configured.
        label: String,
        /// Template image path.
        path: PathBuf,
    },
    /// Anything else.
    Unrecognized(String),
}

impl MenuCommand {
    /// Parse raw text against the fixed labels and the catalog.
    #[must_use]
    pub fn parse(text: &str, catalog: &BackgroundCatalog) -> Self {
        let key = normalize(text);
        let is = |label: &str| normalize(label) == key;

        if is(START) || is(START_ALIAS) {
            Self::Start
        } else if is(BEGIN) {
            Self::Begin
        } else if is(HELP) {
            Self::Help
        } else if is(CHOOSE_BACKGROUND) {
            Self::ChooseBackground
        } else if is(TEMPLATE) {
            Self::Template
        } else if is(COLOR) {
            Self::Color
        } else if is(CUSTOM_BACKGROUND) {
            Self::CustomBackground
        } else if is(BACK) || is(BACK_ALIAS) {
            Self::Back
        } else if let Some(option) = catalog.find_color(text) {
            Self::PickColor {
                label: option.label.clone(),
                rgb: option.rgb,
            }
        } else if let Some(option) = catalog.find_template(text) {
            Self::PickTemplate {
                label: option.label.clone(),
                path: option.path.clone(),
            }
        } else {
            Self::Unrecognized(text.trim().to_owned())
        }
    }
}

/// Which set of quick-select buttons accompanies a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    /// Only the `Begin` button, shown after `/start`.
    Start,
    /// Main menu.
    Main,
    /// Template / colour / custom upload.
    BackgroundMethod,
    /// Palette colours.
    Colors,
    /// Preset templates.
    Templates,
}

impl MenuKind {
    /// Button labels for this menu.
    #[must_use]
    pub fn options(self, catalog: &BackgroundCatalog) -> Vec<String> {
        match self {
            Self::Start => vec![BEGIN.to_owned()],
            Self::Main => vec![CHOOSE_BACKGROUND.to_owned(), HELP.to_owned()],
            Self::BackgroundMethod => vec![
                TEMPLATE.to_owned(),
                COLOR.to_owned(),
                CUSTOM_BACKGROUND.to_owned(),
                BACK.to_owned(),
            ],
            Self::Colors => catalog
                .colors()
                .iter()
                .map(|option| option.label.clone())
                .chain(std::iter::once(BACK.to_owned()))
                .collect(),
            Self::Templates => catalog
                .templates()
                .iter()
                .map(|option| option.label.clone())
                .chain(std::iter::once(BACK.to_owned()))
                .collect(),
        }
    }
}

/// User-facing message texts.
pub mod texts {
    /// Reply to `/start`.
    pub const GREETING: &str =
        "Hi! I remove backgrounds from photos \u{1f5bc}\nPress 'Begin' to get started!";
    /// Reply to `Begin`.
    pub const MAIN_MENU: &str =
        "Send me a photo and I will remove its background.\nYou can also pick a background colour, template, or your own image.";
    /// Reply to `Help`.
    pub const HELP: &str = "To change the background:\n\
        1. Press 'Choose background'\n\
        2. Pick a colour or template, or upload your own photo\n\
        3. Send a photo and get the result!";
    /// Background method prompt.
    pub const CHOOSE_METHOD: &str = "How would you like to set the background?";
    /// Template list prompt.
    pub const CHOOSE_TEMPLATE: &str = "Choose a template:";
    /// Colour list prompt.
    pub const CHOOSE_COLOR: &str = "Choose a background colour:";
    /// Custom upload prompt.
    pub const SEND_BACKGROUND: &str = "Send the image you want to use as your background";
    /// Reply to `Back`.
    pub const BACK: &str = "Back to the main menu";
    /// Reply to unrecognized input.
    pub const UNKNOWN_COMMAND: &str = "Unknown command.";
    /// Confirmation after a custom background upload.
    pub const BACKGROUND_STORED: &str =
        "Background set! Now send the photo whose background should be removed.";
    /// Caption of the composited result.
    pub const DONE: &str = "Done!";
    /// Menu prompt sent after a delivered result.
    pub const NEXT_STEP: &str = "Send another photo or pick a new background.";
    /// Background image could not be loaded.
    pub const BACKGROUND_LOAD_FAILED: &str =
        "The selected background could not be loaded. Pick another one and try again.";
    /// Cutout failed.
    pub const CUTOUT_FAILED: &str =
        "Sorry, I could not remove the background from this photo. Try another image.";
    /// Custom background could not be stored.
    pub const PERSISTENCE_FAILED: &str =
        "That image could not be saved as a background. Please send a JPEG or PNG photo.";
    /// Any other failure.
    pub const INTERNAL_ERROR: &str = "Something went wrong. Please try again.";

    /// Confirmation after picking a colour.
    #[must_use]
    pub fn color_set(label: &str) -> String {
        format!("Background colour set to {label}, now send your photo")
    }

    /// Confirmation after picking a template.
    #[must_use]
    pub fn template_set(label: &str) -> String {
        format!("Template set: {label}, now send your photo")
    }
}
