#![forbid(unsafe_code)]

pub mod app;
pub mod bot;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod imaging;
pub mod menu;
pub mod models;
pub mod monitor;
pub mod session;
pub mod slack;

pub use bot::BackdropBot;
pub use config::GlobalConfig;
pub use errors::{AppError, Result};
