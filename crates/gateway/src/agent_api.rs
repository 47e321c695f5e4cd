//! Agent endpoints: catalog listing and query answering.

use axum::{
    Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use agentdesk_core::agent::AgentSummary;
use agentdesk_core::conversation::{Attachment, ConversationTurn, GenerationRequest, Outcome};
use agentdesk_core::error::{Error, ErrorKind, ErrorResult};

use crate::SharedState;

pub fn agent_router() -> Router<SharedState> {
    Router::new()
        .route("/agents", get(list_agents_handler))
        .route("/agent/ask", post(ask_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default)]
    pub agent: Option<String>,

    #[serde(default)]
    pub query: String,

    /// Prior turns, oldest first. May end with the turn being answered.
    #[serde(default)]
    pub messages: Option<Vec<ConversationTurn>>,

    #[serde(default, alias = "use_vision_model")]
    pub use_vision_model: Option<bool>,

    #[serde(default)]
    pub files: Option<Vec<Attachment>>,
}

impl From<AskRequest> for GenerationRequest {
    fn from(req: AskRequest) -> Self {
        GenerationRequest {
            agent_id: req.agent.unwrap_or_default(),
            query: req.query,
            history: req.messages.unwrap_or_default(),
            use_vision_model: req.use_vision_model.unwrap_or_default(),
            attachments: req.files.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
    pub agent_used: String,
    pub model_used: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentListResponse {
    pub agents: Vec<AgentSummary>,
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

impl From<ErrorResult> for ApiError {
    fn from(result: ErrorResult) -> Self {
        let status = match result.kind {
            ErrorKind::Client => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::Dependency => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: result.message,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        e.to_result().into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: rejection.body_text(),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_agents_handler(State(state): State<SharedState>) -> Json<AgentListResponse> {
    Json(AgentListResponse {
        agents: state.router.registry().list_all(),
    })
}

async fn ask_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(payload) = payload.inspect_err(|e| warn!(error = %e, "Rejected malformed request"))?;
    let request = GenerationRequest::from(payload);
    info!(
        agent = %request.agent_id,
        history = request.history.len(),
        files = request.attachments.len(),
        vision = request.use_vision_model,
        "agent/ask request"
    );

    let result = state.router.ask(request).await?;
    if result.outcome == Outcome::Degraded {
        info!(agent = %result.agent_used, "Answered in degraded mode");
    }

    Ok(Json(AskResponse {
        response: result.text,
        agent_used: result.agent_used,
        model_used: result.model_used,
    }))
}
