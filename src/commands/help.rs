use anyhow::Result;

use crate::commands::{Command, CommandRegistry, Outcome, Reply};

const HELP_TEXT: &str = "Shows help information for available commands. Usage: !help [command]";

/// One line of help: primary name, aliases and description
struct HelpEntry {
    name: String,
    aliases: Vec<String>,
    help: String,
}

/// A command that displays help information for all commands
pub struct HelpCommand {
    prefix: String,
    entries: Vec<HelpEntry>,
}

impl HelpCommand {
    /// Create a help command describing everything in `registry`
    ///
    /// The help command lists itself after the registered commands.
    ///
    /// # Arguments
    /// * `prefix` - The command prefix (e.g., "!")
    /// * `registry` - The commands to describe
    pub fn from_registry(prefix: String, registry: &CommandRegistry) -> Self {
        let mut entries: Vec<HelpEntry> = registry
            .entries()
            .iter()
            .map(|entry| HelpEntry {
                name: entry.name.clone(),
                aliases: entry.aliases.clone(),
                help: entry.command.help().to_string(),
            })
            .collect();

        if !registry.has_command("help") {
            entries.push(HelpEntry {
                name: "help".to_string(),
                aliases: Vec::new(),
                help: HELP_TEXT.to_string(),
            });
        }

        HelpCommand { prefix, entries }
    }

    fn find(&self, word: &str) -> Option<&HelpEntry> {
        let word = word.trim_start_matches(self.prefix.as_str()).to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name == word || e.aliases.iter().any(|a| *a == word))
    }

    fn overview(&self) -> String {
        let commands: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                if entry.aliases.is_empty() {
                    format!("{}{}", self.prefix, entry.name)
                } else {
                    format!(
                        "{}{} ({})",
                        self.prefix,
                        entry.name,
                        entry.aliases.join(", ")
                    )
                }
            })
            .collect();

        format!("Available commands: {}", commands.join(", "))
    }
}

impl Command for HelpCommand {
    fn execute(&self, args: &[&str]) -> Result<Option<Reply>> {
        let reply = match args.first() {
            None => Reply::new(self.overview()),
            Some(word) => match self.find(word) {
                Some(entry) => {
                    let reply = Reply::new(format!("{}{}", self.prefix, entry.name))
                        .with_description(entry.help.clone());
                    if entry.aliases.is_empty() {
                        reply
                    } else {
                        reply.with_field("Aliases", entry.aliases.join(", "))
                    }
                }
                None => Reply::new(format!(
                    "Unknown command: {}{}",
                    self.prefix,
                    word.to_lowercase()
                ))
                .with_outcome(Outcome::Bad),
            },
        };

        Ok(Some(reply))
    }

    fn help(&self) -> &str {
        HELP_TEXT
    }
}
