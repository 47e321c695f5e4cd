//! Caller-owned conversation types: turns, attachments, and the per-call
//! generation request/result.
//!
//! These mirror the JSON shapes the frontend sends. Nothing here is persisted;
//! a `GenerationRequest` lives for exactly one call.

use serde::{Deserialize, Serialize};

use crate::message::Role;

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// Label used when rendering a transcript line.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl From<TurnRole> for Role {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        }
    }
}

/// One prior exchange in the caller's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: None,
            attachments: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: None,
            attachments: Vec::new(),
        }
    }

    /// Whether this turn has any visible text.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// What kind of file the caller attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

/// A file uploaded alongside a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(alias = "type")]
    pub kind: AttachmentKind,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "mime_type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Base64 payload, possibly wrapped in a `data:` URL.
    #[serde(default, rename = "data", alias = "encodedData", skip_serializing_if = "Option::is_none")]
    pub encoded_data: Option<String>,

    #[serde(default, rename = "size", alias = "sizeBytes", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl Attachment {
    /// Build an image attachment from base64 data.
    pub fn image(
        name: impl Into<String>,
        mime_type: Option<&str>,
        encoded_data: impl Into<String>,
    ) -> Self {
        Self {
            kind: AttachmentKind::Image,
            name: name.into(),
            mime_type: mime_type.map(String::from),
            encoded_data: Some(encoded_data.into()),
            size_bytes: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image
    }
}

/// Everything needed to answer one query. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Requested agent id. Empty means the caller did not send one.
    pub agent_id: String,
    pub query: String,
    pub history: Vec<ConversationTurn>,
    pub use_vision_model: bool,
    pub attachments: Vec<Attachment>,
}

impl GenerationRequest {
    pub fn new(agent_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_images(mut self, attachments: Vec<Attachment>) -> Self {
        self.use_vision_model = true;
        self.attachments = attachments;
        self
    }

    /// Whether any attachment is an image.
    pub fn has_images(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}

/// How a successful generation was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    /// Images could not be processed; the answer is text-only and carries a warning marker.
    Degraded,
}

/// A successful answer.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub text: String,
    pub agent_used: String,
    pub model_used: String,
    pub outcome: Outcome,
}
