//! Conversation context assembly.
//!
//! Turns the caller's prior turns plus the current query into what the model
//! sees: either a single transcript-style prompt or a list of role-tagged
//! chat messages. Both forms are pure and deterministic.
//!
//! Guarantees:
//! - the in-flight query never appears as a history entry
//! - the current query is never clipped; only history is trimmed or dropped
//! - all limits count characters, not bytes

use agentdesk_config::ContextConfig;
use agentdesk_core::conversation::ConversationTurn;
use agentdesk_core::message::Message;

const HEADER: &str = "Previous conversation:";
const FOOTER: &str = "Current question: ";

/// Stateless context assembler. Create one and reuse it.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    window_turns: usize,
    max_turn_chars: usize,
    max_prompt_chars: usize,
    message_history_limit: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(&ContextConfig::default())
    }
}

impl ContextAssembler {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            window_turns: config.window_turns,
            max_turn_chars: config.max_turn_chars,
            max_prompt_chars: config.max_prompt_chars,
            message_history_limit: config.message_history_limit,
        }
    }

    /// Build a transcript prompt from recent history and the current query.
    ///
    /// Returns `query` unchanged when there is no usable history.
    pub fn assemble(&self, history: &[ConversationTurn], query: &str) -> String {
        if history.len() <= 1 {
            return query.to_string();
        }

        let window = recent_turns(history, query, self.window_turns);
        if window.is_empty() {
            return query.to_string();
        }

        let footer_len = 2 + FOOTER.chars().count() + query.chars().count();
        if footer_len > self.max_prompt_chars {
            // Not even the question fits alongside a header; history goes.
            return query.to_string();
        }

        let lines: Vec<String> = window
            .iter()
            .map(|turn| {
                format!(
                    "{}: {}",
                    turn.role.label(),
                    clip(turn.content.trim(), self.max_turn_chars)
                )
            })
            .collect();

        let prompt = format!("{HEADER}\n{}\n\n{FOOTER}{query}", lines.join("\n"));
        tail(&prompt, self.max_prompt_chars)
    }

    /// Build role-tagged chat messages from recent history, ending with the query.
    pub fn assemble_messages(&self, history: &[ConversationTurn], query: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = recent_turns(history, query, self.message_history_limit)
            .into_iter()
            .map(|turn| {
                let content = clip(turn.content.trim(), self.max_turn_chars);
                let mut message = Message::user(content);
                message.role = turn.role.into();
                message
            })
            .collect();

        messages.push(Message::user(query));
        messages
    }
}

/// The last `limit` non-blank turns before the in-flight query.
fn recent_turns<'a>(
    history: &'a [ConversationTurn],
    query: &str,
    limit: usize,
) -> Vec<&'a ConversationTurn> {
    let prior = match history.split_last() {
        Some((last, rest)) if is_in_flight(last, query) => rest,
        _ => history,
    };

    let visible: Vec<&ConversationTurn> = prior.iter().filter(|t| !t.is_blank()).collect();
    let skip = visible.len().saturating_sub(limit);
    visible.into_iter().skip(skip).collect()
}

/// Clients usually append the message being answered to the history they send.
fn is_in_flight(turn: &ConversationTurn, query: &str) -> bool {
    turn.role == agentdesk_core::TurnRole::User && turn.content.trim() == query.trim()
}

/// First `max` characters of `s`.
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Last `max` characters of `s`.
fn tail(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    s.chars().skip(len - max).collect()
}
