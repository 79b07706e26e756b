use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::resources::{BANDCHARTS_FILE, MAPS_FILE};

/// Where the image metadata lives and where the images are served from
#[derive(Debug, Clone)]
pub struct ResourceSettings {
    /// Directory holding the metadata JSON files
    pub resources_dir: PathBuf,
    /// Base URL that image filenames are appended to
    pub resources_url: String,
}

impl ResourceSettings {
    /// Create resource settings directly from values
    pub fn new<P: Into<PathBuf>, S: Into<String>>(resources_dir: P, resources_url: S) -> Self {
        ResourceSettings {
            resources_dir: resources_dir.into(),
            resources_url: resources_url.into(),
        }
    }

    /// Load resource settings from environment variables
    ///
    /// `RESOURCES_URL` is required, `RESOURCES_DIR` defaults to `./resources`.
    pub fn from_env() -> Result<Self> {
        let resources_url = env::var("RESOURCES_URL")
            .map_err(|_| anyhow::anyhow!("RESOURCES_URL environment variable not set"))?;

        let resources_dir = env::var("RESOURCES_DIR").unwrap_or_else(|_| "./resources".to_string());

        Ok(ResourceSettings::new(resources_dir, resources_url))
    }

    /// Path of the band chart metadata file
    pub fn bandcharts_path(&self) -> PathBuf {
        self.resources_dir.join(BANDCHARTS_FILE)
    }

    /// Path of the map metadata file
    pub fn maps_path(&self) -> PathBuf {
        self.resources_dir.join(MAPS_FILE)
    }
}

/// Configuration for the chatbot
pub struct Config {
    /// The client ID for the application
    pub client_id: String,
    /// The channel name to connect to
    pub channel_name: String,
    /// The bot's username on Twitch
    pub bot_username: String,
    /// The data directory for storing tokens
    pub data_dir: String,
    /// Image metadata location
    pub resources: ResourceSettings,
}

/// Load variables from `path` if given, otherwise from a `.env` in the working directory
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?;
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
    Ok(())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Returns
    /// A Result containing the Config if successful, or an error if required variables are missing
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("TWITCH_CLIENT_ID")
            .map_err(|_| anyhow::anyhow!("TWITCH_CLIENT_ID environment variable not set"))?;

        let channel_name = env::var("TWITCH_CHANNEL")
            .map_err(|_| anyhow::anyhow!("TWITCH_CHANNEL environment variable not set"))?;

        let bot_username = env::var("TWITCH_BOT_USERNAME")
            .map_err(|_| anyhow::anyhow!("TWITCH_BOT_USERNAME environment variable not set"))?;

        // Optional data directory, default to ./data
        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let resources = ResourceSettings::from_env()?;

        Ok(Config {
            client_id,
            channel_name,
            bot_username,
            data_dir,
            resources,
        })
    }

    /// Create a new config directly from values (useful for testing)
    #[allow(dead_code)]
    pub fn new(
        client_id: String,
        channel_name: String,
        bot_username: String,
        data_dir: String,
        resources: ResourceSettings,
    ) -> Self {
        Config {
            client_id,
            channel_name,
            bot_username,
            data_dir,
            resources,
        }
    }

    /// Get the path to store the OAuth token
    pub fn get_token_path(&self) -> String {
        format!("{}/oauth_token.json", self.data_dir)
    }
}
