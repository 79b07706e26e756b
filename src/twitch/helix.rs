//! Twitch Helix API client
//!
//! Used to send chat replies when the IRC connection refuses them.

use anyhow::{Result, anyhow};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::twitch::oauth::OAuthManager;

/// Default Helix API endpoint
pub const HELIX_URL: &str = "https://api.twitch.tv/helix";

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    data: Vec<MessageData>,
}

#[derive(Debug, Deserialize)]
struct MessageData {
    message_id: String,
    is_sent: bool,
    drop_reason: Option<DropReason>,
}

#[derive(Debug, Deserialize)]
struct DropReason {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    broadcaster_id: &'a str,
    sender_id: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parent_message_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Vec<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

/// Helix API client for chat operations
pub struct HelixChatClient {
    http_client: HttpClient,
    oauth_manager: Arc<Mutex<OAuthManager>>,
    base_url: String,
    bot_user_id: Option<String>,
    /// Broadcaster login -> user ID
    channel_cache: HashMap<String, String>,
}

impl HelixChatClient {
    /// Create a new Helix API client against the public Twitch API
    pub fn new(oauth_manager: Arc<Mutex<OAuthManager>>) -> Result<Self> {
        Self::with_base_url(oauth_manager, HELIX_URL)
    }

    /// Create a new Helix API client against a different endpoint
    pub fn with_base_url(oauth_manager: Arc<Mutex<OAuthManager>>, base_url: &str) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http_client,
            oauth_manager,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_user_id: None,
            channel_cache: HashMap::new(),
        })
    }

    async fn credentials(&self) -> Result<(String, String)> {
        let mut manager = self.oauth_manager.lock().await;
        let token = manager.get_access_token().await?;
        Ok((token, manager.get_client_id().to_string()))
    }

    /// Look up a user ID; `None` means the user the token belongs to
    async fn get_user_id(&self, login: Option<&str>) -> Result<String> {
        let (token, client_id) = self.credentials().await?;

        let mut request = self
            .http_client
            .get(format!("{}/users", self.base_url))
            .bearer_auth(token)
            .header("Client-Id", client_id);
        if let Some(login) = login {
            request = request.query(&[("login", login)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Failed to get user ID: {}", error_text));
        }

        let users: UserResponse = response.json().await?;
        users
            .data
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or_else(|| anyhow!("No user data found for {}", login.unwrap_or("bot")))
    }

    async fn get_bot_user_id(&mut self) -> Result<String> {
        if let Some(id) = &self.bot_user_id {
            return Ok(id.clone());
        }
        let id = self.get_user_id(None).await?;
        self.bot_user_id = Some(id.clone());
        Ok(id)
    }

    async fn get_broadcaster_id(&mut self, channel: &str) -> Result<String> {
        if let Some(id) = self.channel_cache.get(channel) {
            return Ok(id.clone());
        }
        let id = self.get_user_id(Some(channel)).await?;
        self.channel_cache.insert(channel.to_string(), id.clone());
        Ok(id)
    }

    /// Send a chat message, optionally as a reply
    ///
    /// # Arguments
    /// * `channel` - Channel login (without # prefix)
    /// * `message` - Message text to send
    /// * `reply_to` - Optional message ID to reply to
    ///
    /// # Returns
    /// The ID of the sent message
    pub async fn send_chat_message(
        &mut self,
        channel: &str,
        message: &str,
        reply_to: Option<&str>,
    ) -> Result<String> {
        let sender_id = self.get_bot_user_id().await?;
        let broadcaster_id = self.get_broadcaster_id(channel).await?;
        let (token, client_id) = self.credentials().await?;

        let request_body = SendMessageRequest {
            broadcaster_id: &broadcaster_id,
            sender_id: &sender_id,
            message,
            reply_parent_message_id: reply_to,
        };

        info!("Sending message via Helix to {}: {}", channel, message);
        let response = self
            .http_client
            .post(format!("{}/chat/messages", self.base_url))
            .bearer_auth(token)
            .header("Client-Id", client_id)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("API error: {}", error_text);
            return Err(anyhow!("Failed to send message: {}", error_text));
        }

        let send_response: SendMessageResponse = response.json().await?;
        let message_data = send_response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No data returned from send message API"))?;

        if !message_data.is_sent {
            return Err(match message_data.drop_reason {
                Some(reason) => anyhow!("Message not sent: {} - {}", reason.code, reason.message),
                None => anyhow!("Message not sent for unknown reason"),
            });
        }

        info!("Successfully sent message, ID: {}", message_data.message_id);
        Ok(message_data.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const TOKEN: &str =
        r#"{"access_token": "tok", "expires_in": 14400, "refresh_token": "r", "token_type": "bearer"}"#;

    fn authenticated_manager(server: &Server) -> Arc<Mutex<OAuthManager>> {
        let token_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(token_file.path(), TOKEN).unwrap();

        let mut manager = OAuthManager::with_auth_url(
            "cid".to_string(),
            vec!["user:write:chat".to_string()],
            &format!("{}/oauth2", server.url()),
        );
        manager
            .load_token(token_file.path().to_str().unwrap())
            .unwrap();
        Arc::new(Mutex::new(manager))
    }

    // Bot and broadcaster resolve to the same user here
    async fn mock_users(server: &mut Server) -> mockito::Mock {
        server
            .mock("GET", "/helix/users")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"id": "111", "login": "test_channel", "display_name": "Chan"}]}"#)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_send_reply_posts_parent_id() -> Result<()> {
        let mut server = Server::new_async().await;
        let oauth = authenticated_manager(&server);
        let _users = mock_users(&mut server).await;

        let send = server
            .mock("POST", "/helix/chat/messages")
            .match_header("authorization", "Bearer tok")
            .match_header("client-id", "cid")
            .match_body(Matcher::Json(json!({
                "broadcaster_id": "111",
                "sender_id": "111",
                "message": "hello",
                "reply_parent_message_id": "abc"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"message_id": "m1", "is_sent": true, "drop_reason": null}]}"#)
            .create_async()
            .await;

        let mut helix =
            HelixChatClient::with_base_url(oauth, &format!("{}/helix", server.url()))?;
        let id = helix
            .send_chat_message("test_channel", "hello", Some("abc"))
            .await?;

        send.assert_async().await;
        assert_eq!(id, "m1");
        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_message_is_an_error() -> Result<()> {
        let mut server = Server::new_async().await;
        let oauth = authenticated_manager(&server);
        let _users = mock_users(&mut server).await;

        let _send = server
            .mock("POST", "/helix/chat/messages")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [{"message_id": "", "is_sent": false,
                    "drop_reason": {"code": "msg_duplicate", "message": "duplicate"}}]}"#,
            )
            .create_async()
            .await;

        let mut helix =
            HelixChatClient::with_base_url(oauth, &format!("{}/helix", server.url()))?;
        let err = helix
            .send_chat_message("test_channel", "hello", None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("msg_duplicate"));
        Ok(())
    }
}
