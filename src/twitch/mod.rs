//! Twitch chat transport: IRC client, Helix fallback and OAuth device flow

mod client;
mod helix;
mod oauth;

pub use client::TwitchClient;
pub use oauth::{BOT_SCOPES, OAuthManager};
