//! Slack Block Kit message builders.
//!
//! Menus are rendered as a row of buttons under the message text. Each
//! button carries its label as the action value, so a press is handled
//! exactly like the user typing the label.

use slack_morphism::prelude::{
    SlackActionBlockElement, SlackActionsBlock, SlackBlock, SlackBlockButtonElement,
    SlackBlockId, SlackBlockPlainTextOnly, SlackBlockText, SlackSectionBlock,
};

/// Prefix shared by all menu button action IDs.
pub const MENU_ACTION_PREFIX: &str = "menu_";

/// Slack rejects action blocks with more elements than this.
const MAX_BUTTONS: usize = 25;

/// Build a plain text section block.
#[must_use]
pub fn text_section(text: &str) -> SlackBlock {
    SlackBlock::Section(SlackSectionBlock::new().with_text(SlackBlockText::MarkDown(text.into())))
}

/// Build an actions block with one button per label.
#[must_use]
pub fn menu_buttons(labels: &[String]) -> SlackBlock {
    let elements: Vec<SlackActionBlockElement> = labels
        .iter()
        .take(MAX_BUTTONS)
        .enumerate()
        .map(|(index, label)| {
            SlackActionBlockElement::Button(
                SlackBlockButtonElement::new(SlackBlockPlainTextOnly::from(label.as_str()))
                    .with_action_id(format!("{MENU_ACTION_PREFIX}{index}").into())
                    .with_value(label.clone()),
            )
        })
        .collect();
    SlackBlock::Actions(SlackActionsBlock::new(elements).with_block_id(SlackBlockId("menu".into())))
}

/// Message text followed by its menu buttons, if any.
#[must_use]
pub fn menu_message(text: &str, labels: &[String]) -> Vec<SlackBlock> {
    let mut blocks = vec![text_section(text)];
    if !labels.is_empty() {
        blocks.push(menu_buttons(labels));
    }
    blocks
}
