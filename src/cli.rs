use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Band plan, map and greyline commands for Twitch chat
#[derive(Parser, Debug)]
#[command(name = "qrm_images")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Band plan, map and greyline commands for Twitch chat", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// The command prefix for the bot
    #[arg(short, long, default_value = "!", value_parser = parse_prefix)]
    pub prefix: String,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// A blank prefix would turn every chat line into a command
fn parse_prefix(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("the command prefix must not be empty".to_string());
    }
    if value.chars().any(char::is_whitespace) {
        return Err("the command prefix must not contain whitespace".to_string());
    }
    Ok(value.to_string())
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot
    Start {
        /// Channel to join (overrides config file)
        #[arg(short, long)]
        channel: Option<String>,
    },

    /// Generate a sample .env file
    GenEnv {
        /// Path to output the sample .env file
        #[arg(default_value = ".env.example")]
        path: String,
    },

    /// Authenticate with Twitch (get new tokens)
    Auth {
        /// Force re-authentication even if tokens exist
        #[arg(short, long)]
        force: bool,
    },

    /// Load the image metadata files and report what they contain
    Check,

    /// Print the reply a chat command would produce, without connecting to Twitch
    Show {
        /// Command name or alias, e.g. bandplan, map, gl
        command: String,

        /// Argument passed to the command
        arg: Option<String>,

        /// Print the reply as JSON instead of a chat line
        #[arg(long)]
        json: bool,
    },
}
