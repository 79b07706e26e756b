mod greyline;
mod handler;
mod help;
mod images;
mod reply;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use twitch_irc::message::PrivmsgMessage;

pub use greyline::GreylineCommand;
pub use handler::CommandHandler;
pub use help::HelpCommand;
pub use images::ImageLookupCommand;
pub use reply::{Outcome, Reply};

use crate::resources::ImageLibrary;

/// Trait for defining chat commands
pub trait Command: Send + Sync {
    /// Execute the command with the words following its name
    ///
    /// # Arguments
    /// * `args` - The arguments provided to the command
    ///
    /// # Returns
    /// A reply to send to the chat, or None if no response is needed
    fn execute(&self, args: &[&str]) -> Result<Option<Reply>>;

    /// Get the help text for this command
    fn help(&self) -> &str;
}

/// Somewhere replies can be delivered to
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send `message` as a reply to `to`
    async fn reply(&self, to: &PrivmsgMessage, message: &str) -> Result<()>;
}

/// A registered command with its aliases
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub aliases: Vec<String>,
    pub command: Arc<dyn Command>,
}

/// A registry of available commands
///
/// Names and aliases are stored lowercase and resolve to the same entry.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    names: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create a new empty command registry
    pub fn new() -> Self {
        CommandRegistry::default()
    }

    /// Register a command with the given name
    ///
    /// # Arguments
    /// * `name` - The name of the command (without prefix)
    /// * `command` - The command implementation
    pub fn register<S: Into<String>>(&mut self, name: S, command: Arc<dyn Command>) {
        self.register_with_aliases(name, &[], command);
    }

    /// Register a command under a primary name and any number of aliases
    ///
    /// Registering a name or alias that is already taken replaces the old
    /// mapping for that word only.
    pub fn register_with_aliases<S: Into<String>>(
        &mut self,
        name: S,
        aliases: &[&str],
        command: Arc<dyn Command>,
    ) {
        let name = name.into().to_lowercase();
        let aliases: Vec<String> = aliases.iter().map(|a| a.to_lowercase()).collect();
        let position = self.entries.len();

        self.names.insert(name.clone(), position);
        for alias in &aliases {
            self.names.insert(alias.clone(), position);
        }

        self.entries.push(CommandEntry {
            name,
            aliases,
            command,
        });
    }

    /// Check if a command exists in the registry
    ///
    /// # Arguments
    /// * `name` - The name or alias of the command to check
    ///
    /// # Returns
    /// true if the command exists, false otherwise
    pub fn has_command<S: AsRef<str>>(&self, name: S) -> bool {
        self.names.contains_key(&name.as_ref().to_lowercase())
    }

    /// Get a command from the registry
    ///
    /// # Arguments
    /// * `name` - The name or alias of the command to get
    ///
    /// # Returns
    /// Some(command) if the command exists, None otherwise
    pub fn get_command<S: AsRef<str>>(&self, name: S) -> Option<Arc<dyn Command>> {
        self.get_entry(name).map(|entry| entry.command.clone())
    }

    /// Get the full entry (name, aliases, command) for a name or alias
    pub fn get_entry<S: AsRef<str>>(&self, name: S) -> Option<&CommandEntry> {
        self.names
            .get(&name.as_ref().to_lowercase())
            .map(|&position| &self.entries[position])
    }

    /// Get all primary command names in registration order
    pub fn get_command_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// All entries in registration order
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }
}

/// Build the command table for the bot
///
/// # Arguments
/// * `library` - The band chart and map groups
/// * `resources_url` - Base URL image filenames are appended to
/// * `prefix` - The command prefix, used by the help command
pub fn default_registry(library: &ImageLibrary, resources_url: &str, prefix: &str) -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register_with_aliases(
        "bandplan",
        &["plan", "bands"],
        Arc::new(ImageLookupCommand::bandplan(
            library.bandcharts.clone(),
            resources_url.to_string(),
        )),
    );
    registry.register(
        "map",
        Arc::new(ImageLookupCommand::map(
            library.maps.clone(),
            resources_url.to_string(),
        )),
    );
    registry.register_with_aliases(
        "grayline",
        &["greyline", "grey", "gray", "gl"],
        Arc::new(GreylineCommand::new()),
    );

    let help = HelpCommand::from_registry(prefix.to_string(), &registry);
    registry.register("help", Arc::new(help));

    registry
}
