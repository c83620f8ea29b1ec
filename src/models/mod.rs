//! Domain model module declarations.

pub mod action;
pub mod background;
pub mod event;
pub mod session;
