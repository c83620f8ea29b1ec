//! Slack bridge layer modules.

pub mod blocks;
pub mod client;
pub mod events;
pub mod inbox;
