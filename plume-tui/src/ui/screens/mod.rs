mod auth;
mod feed;

pub use auth::{render_login_screen, render_register_screen};
pub use feed::render_feed_screen;
