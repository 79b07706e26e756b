mod cli;
mod commands;
mod config;
mod resources;
#[cfg(test)]
mod test_helpers;
mod twitch;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;
use twitch_irc::message::ServerMessage;

use cli::{Cli, Commands};
use commands::{CommandHandler, CommandRegistry, default_registry};
use config::{Config, ResourceSettings, load_env_file};
use resources::{ImageLibrary, ImagesGroup};
use twitch::{BOT_SCOPES, OAuthManager, TwitchClient};

/// The main entry point for the application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    load_env_file(cli.config.as_deref())?;

    match &cli.command {
        Some(Commands::Start { channel }) => {
            start_bot(cli.prefix.clone(), channel.clone()).await?;
        }
        Some(Commands::GenEnv { path }) => {
            generate_env_file(path)?;
        }
        Some(Commands::Auth { force }) => {
            authenticate(*force).await?;
        }
        Some(Commands::Check) => {
            check_resources(&ResourceSettings::from_env()?)?;
        }
        Some(Commands::Show { command, arg, json }) => {
            let settings = ResourceSettings::from_env()?;
            let library = load_library(&settings)?;
            let registry = default_registry(&library, &settings.resources_url, &cli.prefix);
            println!("{}", render_show(&registry, command, arg.as_deref(), *json)?);
        }
        None => {
            // Default to start command if no subcommand is specified
            start_bot(cli.prefix.clone(), None).await?;
        }
    }

    Ok(())
}

fn create_oauth_manager(config: &Config) -> Arc<Mutex<OAuthManager>> {
    let scopes = BOT_SCOPES.iter().map(|s| s.to_string()).collect();
    Arc::new(Mutex::new(OAuthManager::new(config.client_id.clone(), scopes)))
}

fn ensure_data_dir(config: &Config) -> Result<()> {
    let data_dir = Path::new(&config.data_dir);
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
    }
    Ok(())
}

fn load_library(settings: &ResourceSettings) -> Result<ImageLibrary> {
    info!(
        "Loading image metadata from {}",
        settings.resources_dir.display()
    );
    ImageLibrary::load(settings.bandcharts_path(), settings.maps_path())
        .context("Failed to load image metadata")
}

/// Authenticate with Twitch
///
/// # Arguments
/// * `force` - Force re-authentication even if tokens exist
async fn authenticate(force: bool) -> Result<()> {
    info!("Loading configuration");
    let config = Config::from_env()?;
    ensure_data_dir(&config)?;

    let oauth_manager = create_oauth_manager(&config);

    // Try to load existing token if not forcing re-auth
    let token_path = config.get_token_path();
    if !force && Path::new(&token_path).exists() {
        info!("Loading OAuth token from {}", token_path);
        if let Err(e) = oauth_manager.lock().await.load_token(&token_path) {
            error!("Failed to load token: {}", e);
            println!("Failed to load existing token, will re-authenticate.");
        } else {
            println!("Existing token loaded. Use --force to re-authenticate.");
            return Ok(());
        }
    }

    info!("Starting authentication process");
    oauth_manager.lock().await.authenticate().await?;

    info!("Saving OAuth token to {}", token_path);
    oauth_manager.lock().await.save_token(&token_path)?;

    println!("Authentication successful! Token saved to {}", token_path);

    Ok(())
}

/// Start the bot with the given configuration
async fn start_bot(prefix: String, channel_override: Option<String>) -> Result<()> {
    info!("Loading configuration");
    let mut config = Config::from_env()?;

    if let Some(channel) = channel_override {
        config.channel_name = channel;
    }

    // Metadata first: a bad resource file should fail before we touch Twitch
    let library = load_library(&config.resources)?;

    info!("Starting qrm_images");
    info!("Connecting to channel: {}", config.channel_name);

    ensure_data_dir(&config)?;
    let oauth_manager = create_oauth_manager(&config);

    let token_path = config.get_token_path();
    if Path::new(&token_path).exists() {
        info!("Loading OAuth token from {}", token_path);
        if let Err(e) = oauth_manager.lock().await.load_token(&token_path) {
            error!("Failed to load token: {}", e);
        }
    }

    if !oauth_manager.lock().await.is_authenticated() {
        info!("OAuth token not found or invalid, starting authentication");
        oauth_manager.lock().await.authenticate().await?;

        info!("Saving OAuth token to {}", token_path);
        oauth_manager.lock().await.save_token(&token_path)?;
    }

    let (mut incoming_messages, client) = TwitchClient::new(&config, oauth_manager).await?;
    let client = Arc::new(client);

    client.join_channel(&config.channel_name)?;

    let registry = default_registry(&library, &config.resources.resources_url, &prefix);
    info!(
        "Registered commands: {} with prefix: '{}'",
        registry.get_command_names().join(", "),
        prefix
    );

    let command_handler = Arc::new(CommandHandler::new(
        client.clone(),
        Arc::new(registry),
        prefix.clone(),
    ));

    let channel_name = config.channel_name.clone();
    tokio::spawn(async move {
        info!("Waiting for messages...");

        while let Some(msg) = incoming_messages.recv().await {
            match msg {
                ServerMessage::Privmsg(privmsg) => {
                    debug!("[CHAT] {}: {}", privmsg.sender.name, privmsg.message_text);

                    if let Err(e) = command_handler.handle_message(&privmsg).await {
                        error!("Error handling command: {}", e);
                    }
                }
                ServerMessage::Notice(notice) => {
                    info!("[NOTICE] Channel {}: {}", channel_name, notice.message_text);
                }
                other => {
                    debug!("Received other message type: {:?}", other);
                }
            }
        }

        info!("Incoming message stream closed");
    });

    client
        .send_message(
            &config.channel_name,
            &format!("qrm_images is online! Try {}help", prefix),
        )
        .await?;

    info!("Bot is now running. Press Ctrl+C to exit.");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    Ok(())
}

/// Load both metadata files and print a summary of each
///
/// Fails when either file cannot be loaded, so the process exits non-zero.
fn check_resources(settings: &ResourceSettings) -> Result<()> {
    println!("Resources URL: {}", settings.resources_url);

    let mut failures = 0;
    for path in [settings.bandcharts_path(), settings.maps_path()] {
        match ImagesGroup::load(&path) {
            Ok(group) => {
                println!(
                    "{} {}: {} images",
                    "OK".green().bold(),
                    path.display(),
                    group.len()
                );
                for image in group.iter() {
                    println!("    {:<10} {}", image.key, image.display_name());
                }
            }
            Err(e) => {
                failures += 1;
                println!("{} {}", "FAIL".red().bold(), e);
            }
        }
    }

    if failures > 0 {
        return Err(anyhow!("{} resource file(s) failed to load", failures));
    }
    Ok(())
}

/// Render the reply `command` would send for `arg`, as a chat line or JSON
fn render_show(
    registry: &CommandRegistry,
    command: &str,
    arg: Option<&str>,
    json: bool,
) -> Result<String> {
    let handler = registry
        .get_command(command)
        .ok_or_else(|| anyhow!("Unknown command: {}", command))?;

    let args: Vec<&str> = arg.into_iter().collect();
    let Some(reply) = handler.execute(&args)? else {
        return Ok(String::new());
    };

    if json {
        Ok(serde_json::to_string_pretty(&reply)?)
    } else {
        Ok(reply.to_chat_messages().join("\n"))
    }
}

/// Generate a sample .env file
fn generate_env_file(path: &str) -> Result<()> {
    info!("Generating sample .env file at {}", path);

    let contents = r#"# Your Twitch client ID (get one from Twitch Developer Dashboard)
TWITCH_CLIENT_ID=your_client_id_here
# The channel to join
TWITCH_CHANNEL=channel_name
# The bot's username
TWITCH_BOT_USERNAME=your_bot_username
# Base URL the image filenames are appended to (keep the trailing slash)
RESOURCES_URL=https://example.com/resources/
# Optional: Directory holding bandcharts.1.json and maps.1.json
# RESOURCES_DIR=./resources
# Optional: Data directory for storing tokens
# DATA_DIR=./data
"#;

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;

    info!("Sample .env file generated successfully!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_bandcharts, create_test_maps};
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn create_registry() -> CommandRegistry {
        let library = ImageLibrary {
            bandcharts: create_test_bandcharts(),
            maps: create_test_maps(),
        };
        default_registry(&library, "https://example/res/", "!")
    }

    #[test]
    fn test_show_as_json() -> Result<()> {
        let output = render_show(&create_registry(), "plan", Some("US"), true)?;
        let value: serde_json::Value = serde_json::from_str(&output)?;

        assert_json_eq!(
            value,
            json!({
                "title": "United States 🇺🇸",
                "image_url": "https://example/res/bandcharts/us.png",
                "outcome": "good"
            })
        );
        Ok(())
    }

    #[test]
    fn test_show_not_found_as_json() -> Result<()> {
        let output = render_show(&create_registry(), "map", Some("zz"), true)?;
        let value: serde_json::Value = serde_json::from_str(&output)?;

        assert_json_eq!(
            value,
            json!({
                "title": "Map Not Found!",
                "description": "Possible arguments are:\ncq: CQ Zones\nitu: ITU Zones\n",
                "outcome": "bad"
            })
        );
        Ok(())
    }

    #[test]
    fn test_show_as_chat_line() -> Result<()> {
        let output = render_show(&create_registry(), "map", Some("itu"), false)?;

        assert_eq!(
            output,
            "Worldwide ITU Zones Map | https://example/res/maps/itu.png"
        );
        Ok(())
    }

    #[test]
    fn test_show_unknown_command() {
        let err = render_show(&create_registry(), "nope", None, false).unwrap_err();
        assert!(err.to_string().contains("Unknown command: nope"));
    }

    fn write_resources(maps: &str) -> Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(resources::BANDCHARTS_FILE),
            r#"{"us": {"name": "US", "long_name": "United States", "filename": "us.png"}}"#,
        )?;
        std::fs::write(dir.path().join(resources::MAPS_FILE), maps)?;
        Ok(dir)
    }

    #[test]
    fn test_check_resources_ok() -> Result<()> {
        let dir = write_resources(
            r#"{"cq": {"name": "CQ Zones", "long_name": "CQ Zones Map", "filename": "cq.png"}}"#,
        )?;
        let settings = ResourceSettings::new(dir.path(), "https://example/res/");

        check_resources(&settings)?;
        Ok(())
    }

    #[test]
    fn test_check_resources_fails_on_malformed_file() -> Result<()> {
        let dir = write_resources(r#"{"cq": {"name": "CQ Zones"#)?;
        let settings = ResourceSettings::new(dir.path(), "https://example/res/");

        let err = check_resources(&settings).unwrap_err();
        assert!(err.to_string().contains("1 resource file(s) failed to load"));
        Ok(())
    }

    #[test]
    fn test_check_resources_fails_on_missing_dir() {
        let settings = ResourceSettings::new("/definitely/not/here", "https://example/res/");

        let err = check_resources(&settings).unwrap_err();
        assert!(err.to_string().contains("2 resource file(s) failed to load"));
    }

    #[test]
    fn test_generate_env_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(".env.example");

        generate_env_file(path.to_str().unwrap())?;

        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.contains("RESOURCES_URL="));
        assert!(contents.contains("TWITCH_CLIENT_ID="));
        Ok(())
    }
}
