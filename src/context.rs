//! State threaded through the scenarios of one run.

use crate::schema::RosterMember;

/// Passed by value into each scenario and handed back, possibly updated.
/// Only the roster scenario fills the discovery fields.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub base_url: String,
    pub clan_tag: String,
    /// First roster member's tag with any leading `#` stripped.
    pub discovered_player_tag: Option<String>,
    pub discovered_roster: Option<Vec<RosterMember>>,
}

impl RunContext {
    pub fn new(base_url: impl Into<String>, clan_tag: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clan_tag: clan_tag.into(),
            discovered_player_tag: None,
            discovered_roster: None,
        }
    }

    pub fn with_player_tag(mut self, tag: &str) -> Self {
        self.discovered_player_tag = Some(strip_tag_marker(tag));
        self
    }
}

/// `#2PR8R8V8P` -> `2PR8R8V8P`.
pub fn strip_tag_marker(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_string()
}
