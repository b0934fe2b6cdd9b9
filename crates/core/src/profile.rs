//! User profile — a cached snapshot of the platform's profile record.
//!
//! Fetched once from Slack (`users.profile.get` + `team.info`) and cached
//! in the store until explicitly cleared. The fields the bridge formats into
//! the system prompt are typed; everything else Slack sends rides along in
//! the flattened `extra` map so the cache round-trips losslessly.

use serde::{Deserialize, Serialize};

/// Workspace/team info, merged into the profile at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub name: String,
}

/// A cached user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Format the system prompt the bridge prepends to every conversation.
    pub fn system_prompt(&self) -> String {
        format!(
            "User profile:\nName: {} | Title: {} | Company: {}",
            self.real_name,
            self.title,
            self.team.as_ref().map(|t| t.name.as_str()).unwrap_or("")
        )
    }
}
