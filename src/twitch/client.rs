use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};
use twitch_irc::ClientConfig;
use twitch_irc::TwitchIRCClient;
use twitch_irc::login::{CredentialsPair, LoginCredentials};
use twitch_irc::message::{PrivmsgMessage, ServerMessage};
use twitch_irc::transport::tcp::{NoTLS, TCPTransport};

use crate::commands::ChatSink;
use crate::config::Config;
use crate::twitch::helix::HelixChatClient;
use crate::twitch::oauth::OAuthManager;

type IrcClient = TwitchIRCClient<TCPTransport<NoTLS>, OAuthLoginCredentials>;

/// IRC login backed by the OAuth manager
///
/// twitch-irc asks for credentials on every new connection, so a reconnect
/// after the token has aged picks up a refreshed one.
#[derive(Clone)]
pub struct OAuthLoginCredentials {
    login: String,
    oauth_manager: Arc<Mutex<OAuthManager>>,
}

impl OAuthLoginCredentials {
    pub fn new(login: String, oauth_manager: Arc<Mutex<OAuthManager>>) -> Self {
        OAuthLoginCredentials {
            login,
            oauth_manager,
        }
    }
}

impl fmt::Debug for OAuthLoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthLoginCredentials")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LoginCredentials for OAuthLoginCredentials {
    type Error = anyhow::Error;

    async fn get_credentials(&self) -> Result<CredentialsPair, Self::Error> {
        let token = self.oauth_manager.lock().await.get_access_token().await?;
        Ok(CredentialsPair {
            login: self.login.clone(),
            token: Some(token),
        })
    }
}

/// The Twitch IRC library wants lowercase channel names without the # prefix
fn normalize_channel(channel: &str) -> String {
    channel.trim_start_matches('#').to_lowercase()
}

/// Represents a connection to Twitch chat
#[derive(Clone)]
pub struct TwitchClient {
    /// IRC client for chat operations
    inner: IrcClient,
    /// Helix API client used when IRC sends fail
    helix: Arc<Mutex<HelixChatClient>>,
}

impl TwitchClient {
    /// Create a new Twitch client with the given configuration
    ///
    /// # Arguments
    /// * `config` - The configuration for connecting to Twitch
    /// * `oauth_manager` - The OAuth manager for authentication
    ///
    /// # Returns
    /// The incoming message stream and the client
    pub async fn new(
        config: &Config,
        oauth_manager: Arc<Mutex<OAuthManager>>,
    ) -> Result<(UnboundedReceiver<ServerMessage>, Self)> {
        // Fail early if there is no usable token at all
        oauth_manager.lock().await.get_access_token().await?;

        let credentials =
            OAuthLoginCredentials::new(config.bot_username.clone(), oauth_manager.clone());
        let (incoming_messages, inner) = IrcClient::new(ClientConfig::new_simple(credentials));

        let helix = HelixChatClient::new(oauth_manager)?;

        Ok((
            incoming_messages,
            TwitchClient {
                inner,
                helix: Arc::new(Mutex::new(helix)),
            },
        ))
    }

    /// Join a Twitch channel
    pub fn join_channel(&self, channel: &str) -> Result<()> {
        let channel_name = normalize_channel(channel);
        info!("Joining channel: {}", channel_name);

        self.inner
            .join(channel_name.clone())
            .map_err(|e| anyhow!("Failed to join {}: {}", channel_name, e))
    }

    /// Send a plain message to a channel
    pub async fn send_message(&self, channel: &str, message: &str) -> Result<()> {
        let channel_name = normalize_channel(channel);

        if let Err(e) = self.inner.say(channel_name.clone(), message.to_string()).await {
            warn!("Failed to send message via IRC: {}", e);
            info!("Falling back to Helix API for {}", channel_name);
            self.helix
                .lock()
                .await
                .send_chat_message(&channel_name, message, None)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ChatSink for TwitchClient {
    async fn reply(&self, to: &PrivmsgMessage, message: &str) -> Result<()> {
        info!("Replying in {}: {}", to.channel_login, message);

        let irc_error = match self.inner.say_in_reply_to(to, message.to_string()).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!("Failed to send reply via IRC: {}", irc_error);

        let channel_name = normalize_channel(&to.channel_login);
        let mut helix = self.helix.lock().await;
        match helix
            .send_chat_message(&channel_name, message, Some(&to.message_id))
            .await
        {
            Ok(_) => Ok(()),
            Err(api_e) => {
                error!("Failed to send reply via Helix API: {}", api_e);
                Err(anyhow!("Failed to send reply: {}", api_e))
            }
        }
    }
}
