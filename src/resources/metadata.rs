use serde::Deserialize;

/// Static description of one reference image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Lookup code, always lowercase
    pub key: String,
    /// Short display name used in listings
    pub name: String,
    /// Full name used as the reply title
    pub long_name: String,
    /// Optional flag or symbol shown after the name
    pub emoji: Option<String>,
    /// Optional body text for the reply
    pub description: Option<String>,
    /// Optional attribution for the image
    pub source: Option<String>,
    /// Path of the image relative to the resources base URL
    pub filename: String,
}

impl ImageMetadata {
    /// Display name followed by the emoji, if there is one
    pub fn display_name(&self) -> String {
        with_emoji(&self.name, self.emoji.as_deref())
    }

    /// Long name followed by the emoji, if there is one
    pub fn title(&self) -> String {
        with_emoji(&self.long_name, self.emoji.as_deref())
    }
}

fn with_emoji(text: &str, emoji: Option<&str>) -> String {
    match emoji {
        Some(emoji) => format!("{} {}", text, emoji),
        None => text.to_string(),
    }
}

/// A record as it appears in a resource file
///
/// `key` is only present when the file is a list of records; keyed files
/// carry the code as the object key instead.
#[derive(Debug, Deserialize)]
pub(super) struct RawImage {
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    pub long_name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub filename: String,
}

impl RawImage {
    pub(super) fn into_metadata(self, key: &str) -> ImageMetadata {
        ImageMetadata {
            key: key.trim().to_lowercase(),
            name: self.name,
            long_name: self.long_name,
            emoji: non_empty(self.emoji),
            description: non_empty(self.description),
            source: non_empty(self.source),
            filename: self.filename,
        }
    }
}

// Upstream files use "" for missing values as often as null
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
