use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::commands::{Command, Reply};
use crate::resources::ImagesGroup;

/// Looks a code up in an images group and posts the matching image
///
/// Unknown or missing codes get a listing of every code in the group.
pub struct ImageLookupCommand {
    group: Arc<ImagesGroup>,
    resources_url: String,
    not_found_title: String,
    help: String,
}

impl ImageLookupCommand {
    /// Create a lookup command over `group`
    ///
    /// # Arguments
    /// * `group` - The images to look codes up in
    /// * `resources_url` - Base URL image filenames are appended to
    /// * `not_found_title` - Title of the reply for unknown codes
    /// * `help` - Help text shown by the help command
    pub fn new(
        group: Arc<ImagesGroup>,
        resources_url: String,
        not_found_title: &str,
        help: &str,
    ) -> Self {
        ImageLookupCommand {
            group,
            resources_url,
            not_found_title: not_found_title.to_string(),
            help: help.to_string(),
        }
    }

    /// The frequency allocation chart lookup
    pub fn bandplan(group: Arc<ImagesGroup>, resources_url: String) -> Self {
        Self::new(
            group,
            resources_url,
            "Bandplan Not Found!",
            "Gets the frequency allocations chart for a given country. Usage: !bandplan <region>",
        )
    }

    /// The ham-relevant map lookup
    pub fn map(group: Arc<ImagesGroup>, resources_url: String) -> Self {
        Self::new(
            group,
            resources_url,
            "Map Not Found!",
            "Posts a ham-relevant map. Usage: !map <map>",
        )
    }

    /// Build the reply for a code without needing a chat message
    pub fn lookup(&self, code: &str) -> Reply {
        match self.group.get(code) {
            Some(metadata) => Reply::for_image(metadata, &self.resources_url),
            None => {
                debug!("No image for '{}', sending the list of codes", code);
                Reply::not_found(self.not_found_title.as_str(), &self.group)
            }
        }
    }
}

impl Command for ImageLookupCommand {
    fn execute(&self, args: &[&str]) -> Result<Option<Reply>> {
        let code = args.first().copied().unwrap_or_default();
        Ok(Some(self.lookup(code)))
    }

    fn help(&self) -> &str {
        &self.help
    }
}
