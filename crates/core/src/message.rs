//! Message domain types.
//!
//! A `Message` is what actually goes over the wire to a provider. Incoming
//! request history arrives as `ConversationTurn`s (see `conversation`) and is
//! converted into messages by the context assembler.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a provider conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (agent persona, rules)
    System,
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text { text: String },
    /// An image referenced by URL (usually a `data:` URL)
    ImageUrl { url: String },
}

/// A single message in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Multimodal parts. When non-empty, providers send these instead of `content`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<ContentPart>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            parts: Vec::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a user message carrying text followed by images.
    pub fn user_with_images<I, S>(text: impl Into<String>, image_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let text = text.into();
        let mut parts = vec![ContentPart::Text { text: text.clone() }];
        parts.extend(
            image_urls
                .into_iter()
                .map(|url| ContentPart::ImageUrl { url: url.into() }),
        );

        let mut message = Self::with_role(Role::User, text);
        message.parts = parts;
        message
    }

    /// Number of image parts attached to this message.
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, ContentPart::ImageUrl { .. }))
            .count()
    }
}
