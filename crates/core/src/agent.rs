//! Agent descriptor types.

use serde::{Deserialize, Serialize};

/// How prior conversation turns are handed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStyle {
    /// Flatten history into a "Previous conversation:" transcript prepended to the query.
    #[default]
    Transcript,
    /// Forward history as native role-tagged chat messages.
    Messages,
}

/// A named configuration bundle selecting model and behavior for a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Stable identifier used by clients ("web", "finance", ...)
    pub id: String,

    /// Human-readable name
    pub display_name: String,

    /// One-line description for catalog listings
    pub description: String,

    /// Whether the agent accepts image input
    #[serde(default)]
    pub vision_capable: bool,

    /// System prompt sent ahead of every request
    pub system_instructions: String,

    /// Model id requested from the provider
    pub model: String,

    /// Tool integrations the hosted agent is described as using (informational)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    #[serde(default)]
    pub history_style: HistoryStyle,
}

impl AgentDescriptor {
    /// The catalog entry exposed on discovery endpoints.
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id.clone(),
            name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Public catalog view of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}
