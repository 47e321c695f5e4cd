//! Agent routing for agentdesk.
//!
//! A request is answered in four steps:
//!
//! 1. **Validate** the query and agent id
//! 2. **Resolve** the agent from the [`AgentRegistry`]
//! 3. **Assemble** context: a transcript or chat messages via the
//!    [`ContextAssembler`], or normalized images via the [`ImagePayloadAdapter`]
//! 4. **Generate** through the configured provider, retrying or degrading
//!    along the way
//!
//! [`RequestRouter`] drives all four and is the only entry point the gateway
//! and CLI use.

pub mod context;
pub mod images;
pub mod registry;
pub mod router;
pub mod vision;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::ContextAssembler;
pub use images::{ImagePayloadAdapter, NormalizedImage, NormalizedImages, SkipReason, SkippedImage};
pub use registry::{AgentRegistry, DEFAULT_AGENT_ID};
pub use router::{EMPTY_ANSWER_APOLOGY, RequestRouter};
pub use vision::{DEGRADED_MARKER, VisionStrategy};
