//! Session transition table.
//!
//! Pure functions over [`Session`]: no I/O happens here. The bot engine
//! performs the side effects named by the returned [`Effect`] or
//! [`PhotoRoute`].

use std::path::PathBuf;

use crate::menu::{texts, MenuCommand, MenuKind};
use crate::models::background::BackgroundSpec;
use crate::models::session::{BackgroundChoice, Session, SessionMode};
use crate::{AppError, Result};

/// What the engine should do after a text transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message with the given buttons.
    Reply {
        /// Message text.
        message: String,
        /// Buttons to show.
        menu: MenuKind,
    },
    /// Send the template previews followed by the template list.
    ShowTemplates,
}

impl Effect {
    fn reply(message: impl Into<String>, menu: MenuKind) -> Self {
        Self::Reply {
            message: message.into(),
            menu,
        }
    }
}

/// How an uploaded photo is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRoute {
    /// Persist the photo as the user's custom background.
    StoreBackground,
    /// Composite the photo onto the given background.
    Composite(BackgroundSpec),
}

/// Buttons matching a mode.
#[must_use]
pub fn menu_for(mode: SessionMode) -> MenuKind {
    match mode {
        SessionMode::Idle | SessionMode::WaitingForBackground => MenuKind::Main,
        SessionMode::ChoosingBackgroundMethod => MenuKind::BackgroundMethod,
        SessionMode::ChoosingTemplate => MenuKind::Templates,
        SessionMode::ChoosingColor => MenuKind::Colors,
    }
}

/// Apply a text command to the session.
///
/// Start, Begin, Help, Choose background and Back are accepted in every
/// mode. Method, colour and template labels are only accepted in the mode
/// that offers them.
///
/// # Errors
///
/// Returns `AppError::UnknownCommand` when the command is not valid in the
/// current mode. The session is left untouched in that case.
pub fn apply_text(session: &mut Session, command: MenuCommand) -> Result<Effect> {
    let effect = match (session.mode, command) {
        (_, MenuCommand::Start) => {
            session.reset();
            Effect::reply(texts::GREETING, MenuKind::Start)
        }
        (_, MenuCommand::Begin) => {
            session.set_mode(SessionMode::Idle);
            Effect::reply(texts::MAIN_MENU, MenuKind::Main)
        }
        (mode, MenuCommand::Help) => Effect::reply(texts::HELP, menu_for(mode)),
        (_, MenuCommand::ChooseBackground) => {
            session.set_mode(SessionMode::ChoosingBackgroundMethod);
            Effect::reply(texts::CHOOSE_METHOD, MenuKind::BackgroundMethod)
        }
        (SessionMode::ChoosingBackgroundMethod, MenuCommand::Template) => {
            session.set_mode(SessionMode::ChoosingTemplate);
            Effect::ShowTemplates
        }
        (SessionMode::ChoosingBackgroundMethod, MenuCommand::Color) => {
            session.set_mode(SessionMode::ChoosingColor);
            Effect::reply(texts::CHOOSE_COLOR, MenuKind::Colors)
        }
        (SessionMode::ChoosingBackgroundMethod, MenuCommand::CustomBackground) => {
            session.set_mode(SessionMode::WaitingForBackground);
            Effect::reply(texts::SEND_BACKGROUND, MenuKind::Main)
        }
        (SessionMode::ChoosingColor, MenuCommand::PickColor { label, rgb }) => {
            session.set_color(rgb);
            session.set_mode(SessionMode::Idle);
            Effect::reply(texts::color_set(&label), MenuKind::Main)
        }
        (SessionMode::ChoosingTemplate, MenuCommand::PickTemplate { label, path }) => {
            let message = texts::template_set(&label);
            session.set_background(BackgroundChoice::Template { label, path });
            session.set_mode(SessionMode::Idle);
            Effect::reply(message, MenuKind::Main)
        }
        (_, MenuCommand::Back) => {
            session.set_mode(SessionMode::Idle);
            Effect::reply(texts::BACK, MenuKind::Main)
        }
        (mode, command) => {
            return Err(AppError::UnknownCommand(format!(
                "{command:?} is not valid in mode {mode:?}"
            )));
        }
    };
    Ok(effect)
}

/// Decide what an uploaded photo is for.
///
/// Does not mutate the session: subject photos leave mode and selection as
/// they are so several photos can share one background.
#[must_use]
pub fn route_photo(session: &Session) -> PhotoRoute {
    if session.mode == SessionMode::WaitingForBackground {
        PhotoRoute::StoreBackground
    } else {
        PhotoRoute::Composite(BackgroundSpec::for_session(session))
    }
}

/// Record a durably stored custom background and return to the main menu.
pub fn complete_background_upload(session: &mut Session, path: PathBuf) {
    session.set_background(BackgroundChoice::Uploaded { path });
    session.set_mode(SessionMode::Idle);
}

/// Return to the main menu after a failed upload, keeping the previous
/// selection.
pub fn abort_background_upload(session: &mut Session) {
    session.set_mode(SessionMode::Idle);
}
