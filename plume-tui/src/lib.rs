// Library interface for plume (the binary and integration tests build on it)
#[macro_use]
pub mod logging;

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod debounce;
pub mod feed;
pub mod likes;
pub mod mutations;
pub mod server_config;
pub mod session;
pub mod storage;
pub mod terminal;
pub mod ui;
pub mod viewport;

#[cfg(test)]
pub mod testutil;
