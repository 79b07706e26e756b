use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info};
use twitch_irc::message::PrivmsgMessage;

use crate::commands::{ChatSink, CommandRegistry};

/// Handler for processing incoming chat messages and executing commands
pub struct CommandHandler<S: ChatSink> {
    sink: Arc<S>,
    registry: Arc<CommandRegistry>,
    prefix: String,
}

impl<S: ChatSink> CommandHandler<S> {
    /// Create a new command handler
    ///
    /// # Arguments
    /// * `sink` - Where replies are sent
    /// * `registry` - The registry of available commands, read-only from here on
    /// * `prefix` - The command prefix (e.g., "!")
    ///
    /// # Returns
    /// A new CommandHandler instance
    pub fn new(sink: Arc<S>, registry: Arc<CommandRegistry>, prefix: String) -> Self {
        CommandHandler {
            sink,
            registry,
            prefix,
        }
    }

    /// Process an incoming chat message
    ///
    /// # Arguments
    /// * `msg` - The chat message to process
    ///
    /// # Returns
    /// A Result that is only an error when the reply could not be sent
    pub async fn handle_message(&self, msg: &PrivmsgMessage) -> Result<()> {
        let content = msg.message_text.trim();

        // Check if the message is a command (starts with the prefix)
        let Some(without_prefix) = content.strip_prefix(self.prefix.as_str()) else {
            return Ok(());
        };

        // Parse the command name and arguments
        let mut parts = without_prefix.split_whitespace();
        let Some(command_name) = parts.next() else {
            return Ok(());
        };
        let command_name = command_name.to_lowercase();
        let args: Vec<&str> = parts.collect();

        let Some(command) = self.registry.get_command(&command_name) else {
            debug!("Ignoring unknown command: {}", command_name);
            return Ok(());
        };

        match command.execute(&args) {
            Ok(Some(reply)) => {
                info!(
                    "Executing command: {} for {}",
                    command_name, msg.sender.login
                );
                let reply = reply.mentioning(msg);
                for message in reply.to_chat_messages() {
                    self.sink.reply(msg, &message).await?;
                }
            }
            Ok(None) => {
                // No response needed
                debug!("Command executed with no response: {}", command_name);
            }
            Err(e) => {
                // Command execution failed
                error!("Command execution failed: {}", e);
            }
        }

        Ok(())
    }
}
