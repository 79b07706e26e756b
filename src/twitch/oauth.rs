use anyhow::{Result, anyhow};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default Twitch identity endpoint
pub const TWITCH_AUTH_URL: &str = "https://id.twitch.tv/oauth2";

/// Scopes the bot needs to read chat and reply
pub const BOT_SCOPES: &[&str] = &[
    "chat:read",
    "chat:edit",
    // Needed to look up the bot's user ID
    "user:read:email",
    // Needed for sending replies via Helix API
    "user:write:chat",
];

/// The response from the device code request
#[derive(Debug, Deserialize)]
pub struct DeviceCodeResponse {
    /// The device code to use in token requests
    pub device_code: String,
    /// Time in seconds until the device code expires
    pub expires_in: u64,
    /// Polling interval in seconds
    pub interval: u64,
    /// The code to show to the user
    pub user_code: String,
    /// The URL the user should visit
    pub verification_uri: String,
}

/// The response from the token request
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    /// Time in seconds until the token expires
    pub expires_in: u64,
    pub refresh_token: String,
    #[serde(default)]
    pub scope: Vec<String>,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Manages the bot's OAuth token
pub struct OAuthManager {
    client: Client,
    client_id: String,
    scopes: Vec<String>,
    auth_url: String,
    token: Option<TokenResponse>,
    token_obtained_at: Option<Instant>,
}

impl OAuthManager {
    /// Create a new OAuth manager against the Twitch identity service
    ///
    /// # Arguments
    /// * `client_id` - The client ID for the application
    /// * `scopes` - The scopes needed for the application
    pub fn new(client_id: String, scopes: Vec<String>) -> Self {
        Self::with_auth_url(client_id, scopes, TWITCH_AUTH_URL)
    }

    /// Create a new OAuth manager against a different identity endpoint
    pub fn with_auth_url(client_id: String, scopes: Vec<String>, auth_url: &str) -> Self {
        OAuthManager {
            client: Client::new(),
            client_id,
            scopes,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            token: None,
            token_obtained_at: None,
        }
    }

    pub fn get_client_id(&self) -> &str {
        &self.client_id
    }

    /// Check if the manager holds a token
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Get the current access token, refreshing it when it is close to expiry
    pub async fn get_access_token(&mut self) -> Result<String> {
        let Some(obtained_at) = self.token_obtained_at else {
            return Err(anyhow!("Not authenticated"));
        };
        let Some(expires_in) = self.token.as_ref().map(|t| t.expires_in) else {
            return Err(anyhow!("Not authenticated"));
        };

        // Refresh when fewer than 10 minutes remain
        let expires_in = Duration::from_secs(expires_in);
        if obtained_at.elapsed() > expires_in.saturating_sub(Duration::from_secs(600)) {
            debug!("Token is about to expire, refreshing");
            self.refresh_token().await?;
        }

        self.token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| anyhow!("Not authenticated"))
    }

    /// Start the device code flow
    pub async fn start_device_code_flow(&self) -> Result<DeviceCodeResponse> {
        let form = reqwest::multipart::Form::new()
            .text("client_id", self.client_id.clone())
            .text("scopes", self.scopes.join(" "));

        let response = self
            .client
            .post(format!("{}/device", self.auth_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(anyhow!(
                "Failed to start device code flow: {}",
                error.message
            ));
        }

        Ok(response.json().await?)
    }

    /// Poll for a token until the user approves the device code or it expires
    pub async fn poll_for_token(&mut self, device_code: &DeviceCodeResponse) -> Result<()> {
        let start_time = Instant::now();
        let expiry = Duration::from_secs(device_code.expires_in);
        let interval = Duration::from_secs(device_code.interval);

        info!(
            "Polling for token, will timeout in {} seconds",
            device_code.expires_in
        );

        while start_time.elapsed() < expiry {
            let form = reqwest::multipart::Form::new()
                .text("client_id", self.client_id.clone())
                .text("scopes", self.scopes.join(" "))
                .text("device_code", device_code.device_code.clone())
                .text(
                    "grant_type",
                    "urn:ietf:params:oauth:grant-type:device_code",
                );

            let response = self
                .client
                .post(format!("{}/token", self.auth_url))
                .multipart(form)
                .send()
                .await?;

            if response.status().is_success() {
                self.set_token(response.json().await?);
                return Ok(());
            }

            let error_text = response.text().await?;
            if error_text.contains("authorization_pending") {
                debug!("Authorization pending, waiting {} seconds", interval.as_secs());
                tokio::time::sleep(interval).await;
                continue;
            }

            return Err(anyhow!("Error polling for token: {}", error_text));
        }

        Err(anyhow!("Device code flow timed out"))
    }

    async fn refresh_token(&mut self) -> Result<()> {
        let refresh_token = self
            .token
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or_else(|| anyhow!("No refresh token available"))?;

        let form = reqwest::multipart::Form::new()
            .text("client_id", self.client_id.clone())
            .text("refresh_token", refresh_token)
            .text("grant_type", "refresh_token");

        let response = self
            .client
            .post(format!("{}/token", self.auth_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Failed to refresh token: {}", error_text));
        }

        self.set_token(response.json().await?);
        info!("Refreshed OAuth token");
        Ok(())
    }

    fn set_token(&mut self, token: TokenResponse) {
        self.token = Some(token);
        self.token_obtained_at = Some(Instant::now());
    }

    /// Run the device code flow and wait for user authentication
    pub async fn authenticate(&mut self) -> Result<()> {
        let device_code = self.start_device_code_flow().await?;

        println!("\n=== Twitch Authentication Required ===");
        println!("Please visit: {}", device_code.verification_uri);
        println!("And enter the code: {}", device_code.user_code);
        println!("Waiting for authentication...");

        self.poll_for_token(&device_code).await?;

        info!("Authentication successful!");
        Ok(())
    }

    /// Save token to a file for later use
    pub fn save_token(&self, path: &str) -> Result<()> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| anyhow!("No token to save"))?;
        std::fs::write(path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }

    /// Load token from a file
    ///
    /// The file does not record when the token was issued, so the load time
    /// is used as the issue time.
    pub fn load_token(&mut self, path: &str) -> Result<()> {
        let token_json = std::fs::read_to_string(path)?;
        self.set_token(serde_json::from_str(&token_json)?);
        Ok(())
    }
}
