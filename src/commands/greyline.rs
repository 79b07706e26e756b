use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::commands::{Command, Reply};

/// Fourmilab's Earth viewer, rendering the day/night terminator
pub const GREYLINE_BASE_URL: &str =
    "https://www.fourmilab.ch/cgi-bin/uncgi/Earth?img=ETOPO1_day-m.evif&dynimg=y&opt=-p";

/// Build the greyline image URL for the given instant
pub fn greyline_url(now: DateTime<Utc>) -> String {
    format!(
        "{}&date=1&utc={}",
        GREYLINE_BASE_URL,
        now.format("%Y-%m-%d+%H:%M:%S")
    )
}

/// Posts a map of the current greyline, where HF propagation is best
pub struct GreylineCommand {
    clock: fn() -> DateTime<Utc>,
}

impl Default for GreylineCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GreylineCommand {
    /// Create a greyline command using the system clock
    pub fn new() -> Self {
        GreylineCommand { clock: Utc::now }
    }

    /// Create a greyline command with a custom clock
    #[allow(dead_code)]
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        GreylineCommand { clock }
    }

    /// Build the reply for the clock's current instant
    pub fn current(&self) -> Reply {
        Reply::new("Current Greyline Conditions").with_image(greyline_url((self.clock)()))
    }
}

impl Command for GreylineCommand {
    fn execute(&self, _args: &[&str]) -> Result<Option<Reply>> {
        Ok(Some(self.current()))
    }

    fn help(&self) -> &str {
        "Gets a map of the current greyline, where HF propagation is the best"
    }
}
