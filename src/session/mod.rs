//! Per-user session state: transition table and storage.

pub mod machine;
pub mod store;
