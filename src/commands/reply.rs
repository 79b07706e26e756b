//! Structured replies and their flattening into chat lines

use serde::Serialize;
use twitch_irc::message::PrivmsgMessage;

use crate::resources::{ImageMetadata, ImagesGroup};

/// Twitch rejects chat messages longer than this many characters
pub const MAX_CHAT_MESSAGE_LEN: usize = 500;

const SEPARATOR: &str = " | ";

/// Whether a reply reports a successful lookup or a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Good,
    Bad,
}

/// A named value shown below the reply body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// A command reply, independent of how the chat renders it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<String>,
}

impl Reply {
    /// Create a successful reply with just a title
    pub fn new<S: Into<String>>(title: S) -> Self {
        Reply {
            title: title.into(),
            description: None,
            fields: Vec::new(),
            image_url: None,
            outcome: Outcome::Good,
            mention: None,
        }
    }

    /// Render the reply for an image record
    ///
    /// # Arguments
    /// * `metadata` - The record to show
    /// * `base_url` - Base URL the record's filename is appended to
    pub fn for_image(metadata: &ImageMetadata, base_url: &str) -> Self {
        let mut reply = Reply::new(metadata.title())
            .with_image(format!("{}{}", base_url, metadata.filename));

        if let Some(description) = &metadata.description {
            reply = reply.with_description(description.clone());
        }
        if let Some(source) = &metadata.source {
            reply = reply.with_field("Source", source.clone());
        }

        reply
    }

    /// Render the "not found" reply listing every code in the group
    pub fn not_found<S: Into<String>>(title: S, group: &ImagesGroup) -> Self {
        Reply::new(title)
            .with_description(possible_arguments(group))
            .with_outcome(Outcome::Bad)
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_image<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Address the reply to the sender of `msg`
    pub fn mentioning(mut self, msg: &PrivmsgMessage) -> Self {
        self.mention = Some(msg.sender.name.clone());
        self
    }

    /// Flatten the reply into chat messages
    ///
    /// Parts are joined with ` | ` and packed into as few messages as fit
    /// under `MAX_CHAT_MESSAGE_LEN`. Only a single part that is too long on
    /// its own (free text) is truncated, so listing lines are never dropped.
    pub fn to_chat_messages(&self) -> Vec<String> {
        let mut parts = Vec::new();

        let title = match &self.mention {
            Some(name) => format!("@{} {}", name, self.title),
            None => self.title.clone(),
        };
        parts.push(title);

        if let Some(description) = &self.description {
            parts.extend(
                description
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        for field in &self.fields {
            parts.push(format!("{}: {}", field.name, field.value));
        }

        if let Some(url) = &self.image_url {
            parts.push(url.clone());
        }

        pack_parts(parts)
    }
}

fn pack_parts(parts: Vec<String>) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts.into_iter().map(truncate_chat) {
        let part_len = part.chars().count();
        if current_len > 0 && current_len + SEPARATOR.len() + part_len > MAX_CHAT_MESSAGE_LEN {
            messages.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str(SEPARATOR);
            current_len += SEPARATOR.len();
        }
        current.push_str(&part);
        current_len += part_len;
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

/// The listing shown when a code is unknown: a header and one line per record
pub fn possible_arguments(group: &ImagesGroup) -> String {
    let mut listing = String::from("Possible arguments are:\n");
    for image in group.iter() {
        listing.push_str(&format!("{}: {}\n", image.key, image.display_name()));
    }
    listing
}

fn truncate_chat(message: String) -> String {
    if message.chars().count() <= MAX_CHAT_MESSAGE_LEN {
        return message;
    }
    let mut truncated: String = message.chars().take(MAX_CHAT_MESSAGE_LEN - 3).collect();
    truncated.push_str("...");
    truncated
}
