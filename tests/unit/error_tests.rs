//! Display format of `AppError` variants.

use backdrop_bot::AppError;

#[test]
fn display_uses_kind_prefix() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Slack("x".into()), "slack: x"),
        (AppError::Io("x".into()), "io: x"),
        (AppError::UnknownCommand("x".into()), "unknown command: x"),
        (AppError::BackgroundLoad("x".into()), "background load: x"),
        (AppError::Cutout("x".into()), "cutout: x"),
        (AppError::Persistence("x".into()), "persistence: x"),
        (AppError::Encode("x".into()), "encode: x"),
        (AppError::Unauthorized("x".into()), "unauthorized: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn error_message_no_trailing_period() {
    let err = AppError::Cutout("rembg exited with 1".into());
    assert!(!err.to_string().ends_with('.'));
}

#[test]
fn toml_errors_convert_to_config() {
    let parse: Result<toml::Value, _> = toml::from_str("not = [valid");
    let err: AppError = parse.expect_err("invalid toml").into();
    assert!(err.to_string().starts_with("config: invalid config"));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Io("disk full".into()));
}
