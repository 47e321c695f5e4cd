//! Hosted LLM provider implementations for agentdesk.
//!
//! All providers implement the `agentdesk_core::Provider` trait.
//! The router builds them from configuration and selects the default.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
