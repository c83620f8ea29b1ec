//! Slack Block Kit menu builders.

use backdrop_bot::slack::blocks::{self, MENU_ACTION_PREFIX};
use slack_morphism::prelude::SlackBlock;

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

#[test]
fn menu_buttons_carry_label_as_value() {
    let block = blocks::menu_buttons(&labels(&["Choose background", "Help"]));
    let SlackBlock::Actions(actions) = &block else {
        panic!("menu_buttons must produce an actions block");
    };
    assert_eq!(actions.elements.len(), 2);

    let json = serde_json::to_string(&block).expect("serialise block");
    assert!(json.contains(&format!("{MENU_ACTION_PREFIX}0")));
    assert!(json.contains(&format!("{MENU_ACTION_PREFIX}1")));
    assert!(json.contains("\"value\":\"Choose background\""));
    assert!(json.contains("\"value\":\"Help\""));
}

#[test]
fn menu_buttons_are_capped() {
    let many: Vec<String> = (0..40).map(|i| format!("Color {i}")).collect();
    let SlackBlock::Actions(actions) = blocks::menu_buttons(&many) else {
        panic!("menu_buttons must produce an actions block");
    };
    assert_eq!(actions.elements.len(), 25);
}

#[test]
fn menu_message_omits_empty_menu() {
    assert_eq!(blocks::menu_message("Done!", &[]).len(), 1);
    assert_eq!(blocks::menu_message("Done!", &labels(&["Help"])).len(), 2);
}

#[test]
fn text_section_contains_text() {
    let json = serde_json::to_string(&blocks::text_section("Choose a template:"))
        .expect("serialise block");
    assert!(json.contains("Choose a template:"));
}
