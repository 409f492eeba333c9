pub mod auth;
pub mod boot;
pub mod config;
pub mod lastfm;
pub mod storage;
pub mod ui;

/// Version printed by `-version` and shown in the usage banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
