//! Request router: validates a query, picks an agent, builds the model
//! input, and calls the provider.
//!
//! Every request runs through the same states:
//!
//! 1. **Validate**: blank query or missing agent id is a client error
//! 2. **Resolve** the agent (unknown ids fall back to the general agent)
//! 3. **Assemble** context: transcript or chat messages on the text path,
//!    normalized images on the vision path
//! 4. **Generate**: text path retries once with the bare query; vision path
//!    walks the degradation ladder
//!
//! The router holds no per-request state and is shared behind an `Arc`.

use std::sync::Arc;

use agentdesk_config::{AppConfig, VisionConfig};
use agentdesk_core::agent::{AgentDescriptor, HistoryStyle};
use agentdesk_core::conversation::{GenerationRequest, GenerationResult, Outcome};
use agentdesk_core::error::{Error, ProviderError, Result};
use agentdesk_core::message::Message;
use agentdesk_core::provider::{Provider, ProviderRequest};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::context::ContextAssembler;
use crate::images::ImagePayloadAdapter;
use crate::registry::AgentRegistry;
use crate::vision::VisionStrategy;

/// Returned in place of an empty model answer.
pub const EMPTY_ANSWER_APOLOGY: &str =
    "I'm sorry, I wasn't able to generate a response. Please try rephrasing your question.";

/// Routes generation requests to agents and the model provider.
pub struct RequestRouter {
    provider: Arc<dyn Provider>,
    registry: Arc<AgentRegistry>,
    assembler: ContextAssembler,
    images: ImagePayloadAdapter,
    vision_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RequestRouter {
    /// Create a router with default context, vision, and sampling settings.
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<AgentRegistry>) -> Self {
        let vision = VisionConfig::default();
        Self {
            provider,
            registry,
            assembler: ContextAssembler::default(),
            images: ImagePayloadAdapter::new(&vision),
            vision_model: vision.model,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    /// Create a router with every setting taken from config.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        registry: Arc<AgentRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self::new(provider, registry)
            .with_assembler(ContextAssembler::new(&config.context))
            .with_vision(&config.vision)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_vision(mut self, vision: &VisionConfig) -> Self {
        self.images = ImagePayloadAdapter::new(vision);
        self.vision_model = vision.model.clone();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Answer one query.
    pub async fn ask(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let request_id = Uuid::new_v4();

        if request.query.trim().is_empty() {
            debug!(%request_id, "Rejected request with blank query");
            return Err(Error::InvalidRequest("query must not be empty".into()));
        }
        let requested = request.agent_id.trim();
        if requested.is_empty() {
            debug!(%request_id, "Rejected request without agent id");
            return Err(Error::InvalidRequest("agent must be specified".into()));
        }
        info!(%request_id, agent = %requested, "Request validated");

        let agent = self.registry.resolve(requested);
        info!(%request_id, requested = %requested, agent = %agent.id, "Agent resolved");

        let wants_vision = request.use_vision_model && request.has_images();
        if wants_vision && agent.vision_capable {
            return self.ask_vision(request_id, agent, &request).await;
        }
        if wants_vision {
            info!(
                %request_id,
                agent = %agent.id,
                path = "text",
                "Agent is not vision-capable; ignoring attached images"
            );
        }

        self.ask_text(request_id, agent, &request).await
    }

    async fn ask_text(
        &self,
        request_id: Uuid,
        agent: &AgentDescriptor,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let mut messages = vec![Message::system(&agent.system_instructions)];
        match agent.history_style {
            HistoryStyle::Transcript => messages.push(Message::user(
                self.assembler.assemble(&request.history, &request.query),
            )),
            HistoryStyle::Messages => messages.extend(
                self.assembler
                    .assemble_messages(&request.history, &request.query),
            ),
        }
        info!(
            %request_id,
            agent = %agent.id,
            path = "text",
            history = request.history.len(),
            messages = messages.len(),
            "Context assembled"
        );

        info!(%request_id, agent = %agent.id, path = "text", attempt = 1, "Generating");
        let first = match self.generate(&agent.model, messages).await {
            Ok(text) => return Ok(self.succeeded(request_id, agent, &agent.model, text)),
            Err(e) => e,
        };

        warn!(
            %request_id,
            agent = %agent.id,
            path = "text",
            attempt = 1,
            error = %first,
            "Generation failed; retrying with the bare query"
        );

        let bare = vec![
            Message::system(&agent.system_instructions),
            Message::user(&request.query),
        ];
        info!(%request_id, agent = %agent.id, path = "text", attempt = 2, "Generating");
        match self.generate(&agent.model, bare).await {
            Ok(text) => Ok(self.succeeded(request_id, agent, &agent.model, text)),
            Err(e) => {
                error!(
                    %request_id,
                    agent = %agent.id,
                    path = "text",
                    attempt = 2,
                    error = %e,
                    "Generation failed"
                );
                Err(Error::Provider(e))
            }
        }
    }

    async fn ask_vision(
        &self,
        request_id: Uuid,
        agent: &AgentDescriptor,
        request: &GenerationRequest,
    ) -> Result<GenerationResult> {
        let images = self.images.normalize(&request.attachments);
        let ladder = VisionStrategy::ladder(&images);
        info!(
            %request_id,
            agent = %agent.id,
            path = "vision",
            images = images.images.len(),
            skipped = images.skipped.len(),
            "Images normalized"
        );

        let mut last_error = None;
        for (i, strategy) in ladder.iter().copied().enumerate() {
            info!(
                %request_id,
                agent = %agent.id,
                path = "vision",
                strategy = strategy.as_str(),
                attempt = i + 1,
                total = ladder.len(),
                "Generating"
            );

            let messages = vec![
                Message::system(&agent.system_instructions),
                strategy.user_message(&request.query, &images),
            ];
            match self.generate(&self.vision_model, messages).await {
                Ok(text) => {
                    let mut result = self.succeeded(request_id, agent, &self.vision_model, text);
                    if strategy.is_degraded() {
                        result.text = strategy.finish(result.text);
                        result.outcome = Outcome::Degraded;
                        warn!(
                            %request_id,
                            agent = %agent.id,
                            path = "vision",
                            strategy = strategy.as_str(),
                            "Answered without images"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        %request_id,
                        agent = %agent.id,
                        path = "vision",
                        strategy = strategy.as_str(),
                        error = %e,
                        "Vision strategy failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let e = last_error
            .unwrap_or_else(|| ProviderError::NotConfigured("vision ladder is empty".into()));
        error!(%request_id, agent = %agent.id, path = "vision", error = %e, "Generation failed");
        Err(Error::Provider(e))
    }

    async fn generate(
        &self,
        model: &str,
        messages: Vec<Message>,
    ) -> std::result::Result<String, ProviderError> {
        let mut request = ProviderRequest::new(model, messages).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }

    fn succeeded(
        &self,
        request_id: Uuid,
        agent: &AgentDescriptor,
        model: &str,
        text: String,
    ) -> GenerationResult {
        let text = if text.trim().is_empty() {
            warn!(%request_id, agent = %agent.id, "Model returned an empty answer");
            EMPTY_ANSWER_APOLOGY.to_string()
        } else {
            text
        };
        info!(%request_id, agent = %agent.id, model = %model, chars = text.len(), "Succeeded");
        GenerationResult {
            text,
            agent_used: agent.id.clone(),
            model_used: model.to_string(),
            outcome: Outcome::Succeeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, api_error};
    use crate::vision::DEGRADED_MARKER;
    use agentdesk_core::conversation::{Attachment, ConversationTurn};
    use agentdesk_core::message::Role;

    const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn router(provider: Arc<ScriptedProvider>) -> RequestRouter {
        RequestRouter::new(provider, Arc::new(AgentRegistry::builtin()))
    }

    fn png(name: &str) -> Attachment {
        Attachment::image(name, Some("image/png"), PNG_B64)
    }

    #[tokio::test]
    async fn blank_query_is_rejected_without_calling_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let result = router(provider.clone())
            .ask(GenerationRequest::new("web", "   "))
            .await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_agent_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let result = router(provider.clone())
            .ask(GenerationRequest::new("", "hello"))
            .await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_agent_uses_general_chat() {
        let provider = Arc::new(ScriptedProvider::answering("Hi there"));
        let result = router(provider.clone())
            .ask(GenerationRequest::new("unknown_type", "Hello"))
            .await
            .unwrap();

        assert_eq!(result.text, "Hi there");
        assert_eq!(result.agent_used, "general");
        assert_eq!(result.model_used, "llama3-8b-8192");
        assert_eq!(result.outcome, Outcome::Succeeded);

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages.last().unwrap().content, "Hello");
    }

    #[tokio::test]
    async fn transcript_agent_gets_previous_conversation() {
        let provider = Arc::new(ScriptedProvider::answering("About 2.1 million."));
        let history = vec![
            ConversationTurn::user("What is the capital of France?"),
            ConversationTurn::assistant("Paris."),
            ConversationTurn::user("And its population?"),
        ];
        let result = router(provider.clone())
            .ask(GenerationRequest::new("web", "And its population?").with_history(history))
            .await
            .unwrap();
        assert_eq!(result.agent_used, "web");

        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.model, "llama-3.3-70b-versatile");
        assert_eq!(request.messages.len(), 2);
        let prompt = &request.messages[1].content;
        assert!(prompt.starts_with("Previous conversation:"));
        assert!(prompt.contains("Assistant: Paris."));
        assert!(prompt.ends_with("Current question: And its population?"));
    }

    #[tokio::test]
    async fn general_agent_gets_chat_messages() {
        let provider = Arc::new(ScriptedProvider::answering("ok"));
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];
        router(provider.clone())
            .ask(GenerationRequest::new("general", "how are you?").with_history(history))
            .await
            .unwrap();

        let roles: Vec<Role> = provider.requests()[0]
            .messages
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[tokio::test]
    async fn text_failure_retries_once_with_bare_query() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(api_error(500)),
            Ok("Recovered".into()),
        ]));
        let history = vec![
            ConversationTurn::user("earlier"),
            ConversationTurn::assistant("reply"),
        ];
        let result = router(provider.clone())
            .ask(GenerationRequest::new("finance", "AAPL price?").with_history(history))
            .await
            .unwrap();

        assert_eq!(result.text, "Recovered");
        assert_eq!(provider.call_count(), 2);
        let requests = provider.requests();
        let retry = &requests[1];
        assert_eq!(retry.messages.len(), 2);
        assert_eq!(retry.messages[1].content, "AAPL price?");
    }

    #[tokio::test]
    async fn text_failure_twice_is_dependency_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(api_error(500)),
            Err(api_error(503)),
        ]));
        let err = router(provider.clone())
            .ask(GenerationRequest::new("web", "news?"))
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(err.kind(), agentdesk_core::ErrorKind::Dependency);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn blank_answer_becomes_apology() {
        let provider = Arc::new(ScriptedProvider::answering("  \n"));
        let result = router(provider)
            .ask(GenerationRequest::new("web", "anything"))
            .await
            .unwrap();
        assert_eq!(result.text, EMPTY_ANSWER_APOLOGY);
    }

    #[tokio::test]
    async fn vision_request_sends_all_images_to_vision_model() {
        let provider = Arc::new(ScriptedProvider::answering("Two charts."));
        let result = router(provider.clone())
            .ask(
                GenerationRequest::new("youtube", "What is in these?")
                    .with_images(vec![png("a.png"), png("b.png")]),
            )
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Succeeded);
        assert_eq!(result.model_used, VisionConfig::default().model);
        let requests = provider.requests();
        let request = &requests[0];
        assert_eq!(request.messages[1].image_count(), 2);
    }

    #[tokio::test]
    async fn vision_falls_back_to_first_image() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(api_error(413)),
            Ok("One chart.".into()),
        ]));
        let result = router(provider.clone())
            .ask(
                GenerationRequest::new("linkedin", "Describe")
                    .with_images(vec![png("a.png"), png("b.png")]),
            )
            .await
            .unwrap();

        assert_eq!(result.text, "One chart.");
        assert_eq!(result.outcome, Outcome::Succeeded);
        assert_eq!(provider.requests()[1].messages[1].image_count(), 1);
    }

    #[tokio::test]
    async fn vision_degrades_to_text_only() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(api_error(400)),
            Err(api_error(400)),
            Ok("Text answer.".into()),
        ]));
        let result = router(provider.clone())
            .ask(
                GenerationRequest::new("youtube", "Describe")
                    .with_images(vec![png("a.png"), png("b.png")]),
            )
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(result.outcome, Outcome::Degraded);
        assert!(result.text.starts_with(DEGRADED_MARKER));
        assert!(result.text.ends_with("Text answer."));
        assert_eq!(provider.requests()[2].messages[1].image_count(), 0);
    }

    #[tokio::test]
    async fn unusable_images_go_straight_to_text_only() {
        let provider = Arc::new(ScriptedProvider::answering("Text answer."));
        let result = router(provider.clone())
            .ask(
                GenerationRequest::new("youtube", "Describe")
                    .with_images(vec![Attachment::image("x.png", None, "%%%")]),
            )
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.outcome, Outcome::Degraded);
    }

    #[tokio::test]
    async fn exhausted_ladder_returns_last_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(api_error(400)),
            Err(api_error(401)),
        ]));
        let err = router(provider.clone())
            .ask(GenerationRequest::new("youtube", "Describe").with_images(vec![png("a.png")]))
            .await
            .unwrap_err();

        assert_eq!(provider.call_count(), 2);
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn vision_flag_on_text_agent_uses_text_path() {
        let provider = Arc::new(ScriptedProvider::answering("ok"));
        let result = router(provider.clone())
            .ask(GenerationRequest::new("finance", "Describe").with_images(vec![png("a.png")]))
            .await
            .unwrap();

        assert_eq!(result.model_used, "llama-3.3-70b-versatile");
        assert_eq!(provider.requests()[0].messages[1].image_count(), 0);
    }

    #[tokio::test]
    async fn config_settings_reach_the_provider() {
        let provider = Arc::new(ScriptedProvider::answering("ok"));
        let config = AppConfig {
            default_temperature: 0.2,
            default_max_tokens: 512,
            ..AppConfig::default()
        };
        let router = RequestRouter::from_config(
            provider.clone(),
            Arc::new(AgentRegistry::from_config(&config)),
            &config,
        );
        router
            .ask(GenerationRequest::new("web", "hi"))
            .await
            .unwrap();

        let requests = provider.requests();
        let request = &requests[0];
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(512));
    }
}
