//! Transition table of the session state machine.

use std::path::PathBuf;

use backdrop_bot::menu::{texts, MenuCommand, MenuKind};
use backdrop_bot::models::background::BackgroundSpec;
use backdrop_bot::models::session::{BackgroundChoice, Rgb, Session, SessionMode};
use backdrop_bot::session::machine::{self, Effect, PhotoRoute};
use backdrop_bot::AppError;

const ALL_MODES: [SessionMode; 5] = [
    SessionMode::Idle,
    SessionMode::ChoosingBackgroundMethod,
    SessionMode::ChoosingTemplate,
    SessionMode::ChoosingColor,
    SessionMode::WaitingForBackground,
];

fn session_in(mode: SessionMode) -> Session {
    let mut session = Session::new("U1");
    session.set_mode(mode);
    session
}

fn red() -> MenuCommand {
    MenuCommand::PickColor {
        label: "Red".into(),
        rgb: Rgb(255, 0, 0),
    }
}

fn beach() -> MenuCommand {
    MenuCommand::PickTemplate {
        label: "Beach".into(),
        path: PathBuf::from("/templates/beach.png"),
    }
}

fn reply(message: &str, menu: MenuKind) -> Effect {
    Effect::Reply {
        message: message.to_owned(),
        menu,
    }
}

#[test]
fn start_resets_from_every_mode() {
    for mode in ALL_MODES {
        let mut session = session_in(mode);
        session.set_color(Rgb(1, 2, 3));

        let effect = machine::apply_text(&mut session, MenuCommand::Start).expect("start");

        assert_eq!(effect, reply(texts::GREETING, MenuKind::Start));
        assert_eq!(session.mode, SessionMode::Idle);
        assert_eq!(session.color(), None);
        assert_eq!(session.background(), None);
    }
}

#[test]
fn begin_opens_main_menu_from_every_mode() {
    for mode in ALL_MODES {
        let mut session = session_in(mode);
        let effect = machine::apply_text(&mut session, MenuCommand::Begin).expect("begin");
        assert_eq!(effect, reply(texts::MAIN_MENU, MenuKind::Main));
        assert_eq!(session.mode, SessionMode::Idle);
    }
}

#[test]
fn help_keeps_mode_and_selection() {
    for mode in ALL_MODES {
        let mut session = session_in(mode);
        session.set_color(Rgb(9, 9, 9));
        let effect = machine::apply_text(&mut session, MenuCommand::Help).expect("help");
        assert_eq!(effect, reply(texts::HELP, machine::menu_for(mode)));
        assert_eq!(session.mode, mode);
        assert_eq!(session.color(), Some(Rgb(9, 9, 9)));
    }
}

#[test]
fn choose_background_opens_method_menu() {
    let mut session = Session::new("U1");
    let effect =
        machine::apply_text(&mut session, MenuCommand::ChooseBackground).expect("choose");
    assert_eq!(effect, reply(texts::CHOOSE_METHOD, MenuKind::BackgroundMethod));
    assert_eq!(session.mode, SessionMode::ChoosingBackgroundMethod);
}

#[test]
fn method_menu_transitions() {
    let mut session = session_in(SessionMode::ChoosingBackgroundMethod);
    let effect = machine::apply_text(&mut session, MenuCommand::Template).expect("template");
    assert_eq!(effect, Effect::ShowTemplates);
    assert_eq!(session.mode, SessionMode::ChoosingTemplate);

    let mut session = session_in(SessionMode::ChoosingBackgroundMethod);
    let effect = machine::apply_text(&mut session, MenuCommand::Color).expect("color");
    assert_eq!(effect, reply(texts::CHOOSE_COLOR, MenuKind::Colors));
    assert_eq!(session.mode, SessionMode::ChoosingColor);

    let mut session = session_in(SessionMode::ChoosingBackgroundMethod);
    let effect =
        machine::apply_text(&mut session, MenuCommand::CustomBackground).expect("custom");
    assert_eq!(effect, reply(texts::SEND_BACKGROUND, MenuKind::Main));
    assert_eq!(session.mode, SessionMode::WaitingForBackground);
}

#[test]
fn picking_a_color_clears_background() {
    let mut session = session_in(SessionMode::ChoosingColor);
    session.set_background(BackgroundChoice::Uploaded {
        path: PathBuf::from("/bg/U1_bg.png"),
    });
    session.set_mode(SessionMode::ChoosingColor);

    let effect = machine::apply_text(&mut session, red()).expect("pick color");

    assert_eq!(effect, reply(&texts::color_set("Red"), MenuKind::Main));
    assert_eq!(session.color(), Some(Rgb(255, 0, 0)));
    assert_eq!(session.background(), None);
    assert_eq!(session.mode, SessionMode::Idle);
}

#[test]
fn picking_a_template_clears_color() {
    let mut session = session_in(SessionMode::ChoosingTemplate);
    session.set_color(Rgb(0, 0, 255));

    let effect = machine::apply_text(&mut session, beach()).expect("pick template");

    assert_eq!(effect, reply(&texts::template_set("Beach"), MenuKind::Main));
    assert_eq!(session.color(), None);
    assert!(matches!(
        session.background(),
        Some(BackgroundChoice::Template { path, .. }) if path == &PathBuf::from("/templates/beach.png")
    ));
    assert_eq!(session.mode, SessionMode::Idle);
}

#[test]
fn back_returns_to_main_menu_keeping_selection() {
    for mode in ALL_MODES {
        let mut session = session_in(mode);
        session.set_color(Rgb(0, 255, 0));
        let effect = machine::apply_text(&mut session, MenuCommand::Back).expect("back");
        assert_eq!(effect, reply(texts::BACK, MenuKind::Main));
        assert_eq!(session.mode, SessionMode::Idle);
        assert_eq!(session.color(), Some(Rgb(0, 255, 0)));
    }
}

#[test]
fn scoped_labels_outside_their_mode_are_unknown() {
    let scoped = [
        (MenuCommand::Template, SessionMode::ChoosingBackgroundMethod),
        (MenuCommand::Color, SessionMode::ChoosingBackgroundMethod),
        (
            MenuCommand::CustomBackground,
            SessionMode::ChoosingBackgroundMethod,
        ),
        (red(), SessionMode::ChoosingColor),
        (beach(), SessionMode::ChoosingTemplate),
    ];
    for (command, valid_mode) in scoped {
        for mode in ALL_MODES.into_iter().filter(|mode| *mode != valid_mode) {
            let mut session = session_in(mode);
            let before = session.clone();
            let result = machine::apply_text(&mut session, command.clone());
            assert!(
                matches!(result, Err(AppError::UnknownCommand(_))),
                "{command:?} in {mode:?} must be unknown"
            );
            assert_eq!(session, before);
        }
    }
}

#[test]
fn free_text_is_unknown_in_every_mode() {
    for mode in ALL_MODES {
        let mut session = session_in(mode);
        let before = session.clone();
        let result =
            machine::apply_text(&mut session, MenuCommand::Unrecognized("hello".into()));
        assert!(matches!(result, Err(AppError::UnknownCommand(_))));
        assert_eq!(session, before);
    }
}

#[test]
fn photo_routing() {
    let waiting = session_in(SessionMode::WaitingForBackground);
    assert_eq!(machine::route_photo(&waiting), PhotoRoute::StoreBackground);

    let fresh = Session::new("U1");
    assert_eq!(
        machine::route_photo(&fresh),
        PhotoRoute::Composite(BackgroundSpec::Default)
    );

    let mut colored = session_in(SessionMode::ChoosingTemplate);
    colored.set_color(Rgb(255, 0, 0));
    assert_eq!(
        machine::route_photo(&colored),
        PhotoRoute::Composite(BackgroundSpec::SolidColor {
            color: Rgb(255, 0, 0)
        })
    );
}

#[test]
fn upload_completion_and_abort() {
    let mut session = session_in(SessionMode::WaitingForBackground);
    session.set_color(Rgb(1, 1, 1));
    session.set_mode(SessionMode::WaitingForBackground);

    machine::abort_background_upload(&mut session);
    assert_eq!(session.mode, SessionMode::Idle);
    assert_eq!(session.color(), Some(Rgb(1, 1, 1)));

    session.set_mode(SessionMode::WaitingForBackground);
    machine::complete_background_upload(&mut session, PathBuf::from("/bg/U1_bg.jpg"));
    assert_eq!(session.mode, SessionMode::Idle);
    assert_eq!(session.color(), None);
    assert_eq!(
        BackgroundSpec::for_session(&session),
        BackgroundSpec::UserImage {
            path: PathBuf::from("/bg/U1_bg.jpg")
        }
    );
}

#[test]
fn menu_for_each_mode() {
    assert_eq!(machine::menu_for(SessionMode::Idle), MenuKind::Main);
    assert_eq!(
        machine::menu_for(SessionMode::ChoosingBackgroundMethod),
        MenuKind::BackgroundMethod
    );
    assert_eq!(
        machine::menu_for(SessionMode::ChoosingTemplate),
        MenuKind::Templates
    );
    assert_eq!(machine::menu_for(SessionMode::ChoosingColor), MenuKind::Colors);
    assert_eq!(
        machine::menu_for(SessionMode::WaitingForBackground),
        MenuKind::Main
    );
}
