//! Shared test helpers for router tests.

use agentdesk_core::error::ProviderError;
use agentdesk_core::message::Message;
use agentdesk_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that plays back a script of outcomes.
///
/// Each call to `complete` consumes the next entry and records the request.
/// Panics if more calls are made than entries provided.
pub struct ScriptedProvider {
    script: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(text: &str) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut script = self.script.lock().unwrap();
        assert!(
            !script.is_empty(),
            "ScriptedProvider: no more responses (call #{})",
            requests.len() + 1
        );

        let model = request.model.clone();
        requests.push(request);
        script.remove(0).map(|text| make_text_response(&text, &model))
    }
}

pub fn make_text_response(text: &str, model: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: model.into(),
    }
}

pub fn api_error(status_code: u16) -> ProviderError {
    ProviderError::ApiError {
        status_code,
        message: "upstream failure".into(),
    }
}
