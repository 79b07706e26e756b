#![allow(dead_code)]
/// Test helpers for unit tests
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use twitch_irc::message::{IRCMessage, PrivmsgMessage};

use crate::commands::ChatSink;
use crate::config::{Config, ResourceSettings};
use crate::resources::{ImageMetadata, ImagesGroup};

/// Build a chat message from `test_user` in `#test_channel`
pub fn create_dummy_privmsg(text: &str) -> PrivmsgMessage {
    let raw = format!(
        "@badge-info=;badges=;color=;display-name=Test_User;emotes=;id=abc;room-id=456;\
         tmi-sent-ts=1700000000000;user-id=123 \
         :test_user!test_user@test_user.tmi.twitch.tv PRIVMSG #test_channel :{}",
        text
    );
    let irc_message = IRCMessage::parse(&raw).expect("valid IRC line");
    PrivmsgMessage::try_from(irc_message).expect("valid PRIVMSG")
}

/// Build an image record with no description or source
pub fn image(
    key: &str,
    name: &str,
    long_name: &str,
    emoji: Option<&str>,
    filename: &str,
) -> ImageMetadata {
    ImageMetadata {
        key: key.to_string(),
        name: name.to_string(),
        long_name: long_name.to_string(),
        emoji: emoji.map(str::to_string),
        description: None,
        source: None,
        filename: filename.to_string(),
    }
}

/// A small band chart group: `us` then `ca`
pub fn create_test_bandcharts() -> Arc<ImagesGroup> {
    Arc::new(ImagesGroup::from_images(vec![
        image("us", "US", "United States", Some("🇺🇸"), "bandcharts/us.png"),
        image("ca", "Canada", "Canada", Some("🇨🇦"), "bandcharts/ca.png"),
    ])
    .expect("unique keys"))
}

/// A small map group: `cq` then `itu`
pub fn create_test_maps() -> Arc<ImagesGroup> {
    Arc::new(ImagesGroup::from_images(vec![
        image("cq", "CQ Zones", "Worldwide CQ Zones Map", None, "maps/cq.png"),
        image("itu", "ITU Zones", "Worldwide ITU Zones Map", None, "maps/itu.png"),
    ])
    .expect("unique keys"))
}

/// Create a test config for unit tests
pub fn create_test_config() -> Config {
    Config::new(
        "test_client_id".to_string(),
        "test_channel".to_string(),
        "test_bot".to_string(),
        "./test_data".to_string(),
        ResourceSettings::new("./resources", "https://example/res/"),
    )
}

/// Chat sink that records replies instead of sending them
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn reply(&self, to: &PrivmsgMessage, message: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.channel_login.clone(), message.to_string()));
        Ok(())
    }
}
