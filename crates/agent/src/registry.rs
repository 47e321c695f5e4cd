//! Agent registry: the static catalog of agents a request can be routed to.
//!
//! Built once at startup (built-in catalog plus config overrides) and shared
//! read-only. Unknown ids fall back to the general chat agent instead of
//! failing.

use agentdesk_config::{AgentOverride, AppConfig};
use agentdesk_core::agent::{AgentDescriptor, AgentSummary, HistoryStyle};
use tracing::{debug, warn};

/// Id of the agent every unrecognized id resolves to.
pub const DEFAULT_AGENT_ID: &str = "general";

const MARKDOWN_DIRECTIVE: &str = "Format your responses in Markdown.";

/// Immutable catalog of agent descriptors.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    /// Registration order is the listing order.
    agents: Vec<AgentDescriptor>,
    default_index: usize,
}

impl AgentRegistry {
    /// The built-in catalog using default model choices.
    pub fn builtin() -> Self {
        Self::from_config(&AppConfig::default())
    }

    /// The built-in catalog with models and overrides taken from config.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut agents = builtin_agents(&config.default_model, &config.chat_model);

        for (id, overrides) in &config.agents {
            match agents.iter_mut().find(|a| &a.id == id) {
                Some(agent) => {
                    apply_override(agent, overrides);
                    debug!(agent = %id, "Applied agent override from config");
                }
                None => warn!(agent = %id, "Ignoring override for unknown agent"),
            }
        }

        let default_index = agents
            .iter()
            .position(|a| a.id == DEFAULT_AGENT_ID)
            .unwrap_or(0);

        Self {
            agents,
            default_index,
        }
    }

    /// Resolve an id to its descriptor, falling back to the default agent.
    pub fn resolve(&self, agent_id: &str) -> &AgentDescriptor {
        self.get(agent_id).unwrap_or_else(|| {
            debug!(requested = %agent_id, fallback = DEFAULT_AGENT_ID, "Unknown agent id");
            self.default_agent()
        })
    }

    /// Exact lookup without fallback.
    pub fn get(&self, agent_id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    /// The general-purpose, non-vision agent.
    pub fn default_agent(&self) -> &AgentDescriptor {
        &self.agents[self.default_index]
    }

    /// Catalog entries in registration order.
    pub fn list_all(&self) -> Vec<AgentSummary> {
        self.agents.iter().map(AgentDescriptor::summary).collect()
    }

    /// Full descriptors in registration order.
    pub fn descriptors(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn apply_override(agent: &mut AgentDescriptor, overrides: &AgentOverride) {
    if let Some(name) = &overrides.display_name {
        agent.display_name = name.clone();
    }
    if let Some(description) = &overrides.description {
        agent.description = description.clone();
    }
    if let Some(model) = &overrides.model {
        agent.model = model.clone();
    }
    if let Some(instructions) = &overrides.instructions {
        agent.system_instructions = with_markdown(instructions);
    }
    if let Some(vision) = overrides.vision_capable {
        agent.vision_capable = vision;
    }
}

fn with_markdown(instructions: &str) -> String {
    format!("{}\n\n{MARKDOWN_DIRECTIVE}", instructions.trim_end())
}

struct Builtin {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    instructions: &'static str,
    tools: &'static [&'static str],
    vision: bool,
}

const SPECIALISTS: &[Builtin] = &[
    Builtin {
        id: "web",
        name: "Web Research Agent",
        description: "Searches the web and answers with cited sources",
        instructions: "You are a web research agent. Always cite sources.",
        tools: &["duckduckgo"],
        vision: false,
    },
    Builtin {
        id: "finance",
        name: "Finance Agent",
        description: "Looks up stock prices and company information",
        instructions: "You are a finance agent. Summarize financial data with tables.",
        tools: &["yfinance"],
        vision: false,
    },
    Builtin {
        id: "youtube",
        name: "YouTube Data Agent",
        description: "Gathers and summarizes YouTube video data",
        instructions: "You are a video research agent. Gather and summarize YouTube video data for queries.",
        tools: &["duckduckgo"],
        vision: true,
    },
    Builtin {
        id: "articles",
        name: "Articles Summarizer Agent",
        description: "Finds articles and summarizes them for LinkedIn posts",
        instructions: "You are an article research agent. Find articles and summarize them for LinkedIn posts.",
        tools: &["duckduckgo"],
        vision: false,
    },
    Builtin {
        id: "linkedin",
        name: "LinkedIn Post Generator Agent",
        description: "Combines research into LinkedIn-ready posts",
        instructions: "You are a social media writer. Combine research and generate LinkedIn-ready summaries.",
        tools: &["duckduckgo"],
        vision: true,
    },
];

fn builtin_agents(specialist_model: &str, chat_model: &str) -> Vec<AgentDescriptor> {
    let general = AgentDescriptor {
        id: DEFAULT_AGENT_ID.into(),
        display_name: "General Chat".into(),
        description: "General-purpose conversational assistant".into(),
        vision_capable: false,
        system_instructions: with_markdown("You are a helpful, concise assistant."),
        model: chat_model.into(),
        tools: Vec::new(),
        history_style: HistoryStyle::Messages,
    };

    std::iter::once(general)
        .chain(SPECIALISTS.iter().map(|b| AgentDescriptor {
            id: b.id.into(),
            display_name: b.name.into(),
            description: b.description.into(),
            vision_capable: b.vision,
            system_instructions: with_markdown(b.instructions),
            model: specialist_model.into(),
            tools: b.tools.iter().map(|t| t.to_string()).collect(),
            history_style: HistoryStyle::Transcript,
        }))
        .collect()
}
