//! # agentdesk Core
//!
//! Domain types, traits, and error definitions for the agentdesk query router.
//! This crate has **no framework dependencies**: it defines the domain model
//! that the other crates implement against.
//!
//! The model provider is a trait here; the HTTP implementation lives in
//! `agentdesk-providers`, which keeps the router testable with stub providers.

pub mod agent;
pub mod conversation;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDescriptor, AgentSummary, HistoryStyle};
pub use conversation::{
    Attachment, AttachmentKind, ConversationTurn, GenerationRequest, GenerationResult, Outcome,
    TurnRole,
};
pub use error::{Error, ErrorKind, ErrorResult, ProviderError, Result};
pub use message::{ContentPart, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
