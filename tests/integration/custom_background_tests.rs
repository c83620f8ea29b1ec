//! Custom background upload through the bot.

use backdrop_bot::menu::texts;
use backdrop_bot::models::event::Photo;
use backdrop_bot::models::session::{BackgroundChoice, Rgb, SessionMode};

use super::test_helpers::{
    delivered_rgb, only_text, png_bytes, say, send_photo, test_env, transparent_photo,
};

#[tokio::test]
async fn uploaded_background_is_stored_and_used() {
    let env = test_env();
    say(&env.bot, "U1", "Choose background").await;
    let actions = say(&env.bot, "U1", "Custom background").await;
    assert_eq!(only_text(&actions).0, texts::SEND_BACKGROUND);
    assert_eq!(env.bot.session("U1").mode, SessionMode::WaitingForBackground);

    let background = Photo::new(png_bytes(6, 6, [0, 128, 0, 255]), Some("png".into()));
    let actions = send_photo(&env.bot, "U1", background).await;

    let (message, menu) = only_text(&actions);
    assert_eq!(message, texts::BACKGROUND_STORED);
    assert_eq!(menu, ["Choose background", "Help"]);

    let session = env.bot.session("U1");
    assert_eq!(session.mode, SessionMode::Idle);
    assert_eq!(session.color(), None);
    let Some(BackgroundChoice::Uploaded { path }) = session.background() else {
        panic!("expected an uploaded background, got {:?}", session.background());
    };
    assert!(path.is_file());
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("U1_bg.png"));
    assert!(path.starts_with(env.bot.storage().root()));
    assert!(env.config.background_root.join("U1_bg.png").is_file());

    let actions = send_photo(&env.bot, "U1", transparent_photo()).await;
    let result = delivered_rgb(&actions).to_rgb8();
    assert_eq!((result.width(), result.height()), (4, 3));
    assert!(result.pixels().all(|p| p.0 == [0, 128, 0]));
}

#[tokio::test]
async fn corrupt_upload_keeps_previous_selection() {
    let env = test_env();
    for text in ["Choose background", "Color", "Red", "Choose background", "Custom background"] {
        say(&env.bot, "U1", text).await;
    }

    let corrupt = Photo::new(b"GIF89a-but-not-really".to_vec(), Some("gif".into()));
    let actions = send_photo(&env.bot, "U1", corrupt).await;

    let (message, menu) = only_text(&actions);
    assert_eq!(message, texts::PERSISTENCE_FAILED);
    assert_eq!(menu, ["Choose background", "Help"]);
    let session = env.bot.session("U1");
    assert_eq!(session.mode, SessionMode::Idle);
    assert_eq!(session.color(), Some(Rgb(255, 0, 0)));
    assert_eq!(env.bot.storage().count().expect("count"), 0);
}

#[tokio::test]
async fn second_upload_replaces_first() {
    let env = test_env();
    for hint in ["jpg", "png"] {
        say(&env.bot, "U1", "Choose background").await;
        say(&env.bot, "U1", "Custom background").await;
        let photo = Photo::new(png_bytes(2, 2, [9, 9, 9, 255]), Some(hint.into()));
        send_photo(&env.bot, "U1", photo).await;
    }

    assert_eq!(env.bot.storage().count().expect("count"), 1);
    let session = env.bot.session("U1");
    let Some(BackgroundChoice::Uploaded { path }) = session.background() else {
        panic!("expected an uploaded background, got {:?}", session.background());
    };
    assert_eq!(path, &env.bot.storage().path_for("U1", "png"));
}

#[tokio::test]
async fn misnamed_upload_still_composites() {
    for hint in ["png", "jpg", "jpeg", "txt", "heic"] {
        let env = test_env();
        say(&env.bot, "U1", "Choose background").await;
        say(&env.bot, "U1", "Custom background").await;
        let background = Photo::new(png_bytes(6, 6, [0, 128, 0, 255]), Some(hint.into()));
        let actions = send_photo(&env.bot, "U1", background).await;
        assert_eq!(only_text(&actions).0, texts::BACKGROUND_STORED, "hint {hint}");

        let actions = send_photo(&env.bot, "U1", transparent_photo()).await;

        let result = delivered_rgb(&actions).to_rgb8();
        assert!(
            result.pixels().all(|p| p.0 == [0, 128, 0]),
            "hint {hint} composited onto the wrong background"
        );
    }
}

#[tokio::test]
async fn deleted_upload_reports_background_load_failure() {
    let env = test_env();
    say(&env.bot, "U1", "Choose background").await;
    say(&env.bot, "U1", "Custom background").await;
    send_photo(
        &env.bot,
        "U1",
        Photo::new(png_bytes(2, 2, [1, 1, 1, 255]), Some("png".into())),
    )
    .await;
    std::fs::remove_file(env.bot.storage().path_for("U1", "png")).expect("remove");

    let actions = send_photo(&env.bot, "U1", transparent_photo()).await;

    assert_eq!(only_text(&actions).0, texts::BACKGROUND_LOAD_FAILED);
}

#[tokio::test]
async fn text_while_waiting_for_upload_is_unknown() {
    let env = test_env();
    say(&env.bot, "U1", "Choose background").await;
    say(&env.bot, "U1", "Custom background").await;

    let actions = say(&env.bot, "U1", "here it comes").await;

    assert_eq!(only_text(&actions).0, texts::UNKNOWN_COMMAND);
    assert_eq!(env.bot.session("U1").mode, SessionMode::WaitingForBackground);
}
