//! Chat-completion client for the OpenAI API.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// System prompt for the open-chat mode.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Be friendly and \
informative. If you do not know the answer, say so honestly.";

const FACT_SYSTEM_PROMPT: &str = "You are an assistant that shares interesting, \
educational facts.";

const FACT_USER_PROMPT: &str = "Tell me one surprising random fact from any field of \
knowledge. It should be educational, unexpected and short (3-4 sentences at most).";

/// Bound on every outbound completion call. A timeout surfaces as a gateway
/// failure instead of a hung session.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct OpenAi {
    api_key: String,
    api_base: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

const MODEL: &str = "gpt-4o-mini";

#[derive(Serialize)]
struct ApiRequest {
    model: &'static str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Prepend the mode's system prompt to the accumulated history.
/// The returned list is exactly what goes on the wire, in order.
pub fn assemble(system: &str, history: &[ChatTurn]) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 1);
    turns.push(ChatTurn::system(system));
    turns.extend(history.iter().cloned());
    turns
}

impl OpenAi {
    pub fn new(api_key: String, api_base: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self { api_key, api_base, http }
    }

    pub async fn chat(
        &self,
        turns: &[ChatTurn],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, Error> {
        let messages: Vec<ApiMessage> = turns
            .iter()
            .map(|t| ApiMessage {
                role: t.role.as_str(),
                content: t.content.clone(),
            })
            .collect();

        let request = ApiRequest {
            model: MODEL,
            max_tokens,
            temperature,
            messages,
        };

        debug!("Completion request: {} message(s)", turns.len());

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        let text = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|s| s.trim().to_string())
            .ok_or(Error::Empty)?;

        if text.is_empty() {
            return Err(Error::Empty);
        }

        Ok(text)
    }

    /// One short surprising fact, no conversation state.
    pub async fn random_fact(&self) -> Result<String, Error> {
        info!("Requesting a random fact");
        let turns = [
            ChatTurn::system(FACT_SYSTEM_PROMPT),
            ChatTurn::user(FACT_USER_PROMPT),
        ];
        self.chat(&turns, 200, 0.8).await
    }

    /// Reply to the whole accumulated dialog (open chat and voice modes).
    pub async fn reply_with_history(&self, history: &[ChatTurn]) -> Result<String, Error> {
        let turns = assemble(CHAT_SYSTEM_PROMPT, history);
        self.chat(&turns, 1000, 0.7).await
    }

    /// Single-shot reply under a registry system prompt (persona, translator,
    /// quiz question generation). No history is carried.
    pub async fn styled_reply(
        &self,
        text: &str,
        system_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, Error> {
        let turns = [ChatTurn::system(system_prompt), ChatTurn::user(text)];
        self.chat(&turns, max_tokens, 0.8).await
    }
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
    Empty,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_prepends_system() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let turns = assemble("be helpful", &history);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, "be helpful");
        assert_eq!(turns[1].role, Role::User);
        assert_eq!(turns[2].role, Role::Assistant);
    }

    #[test]
    fn test_assemble_preserves_order_after_three_exchanges() {
        // After 3 exchanges plus a new user turn, the wire list is the system
        // prompt, 6 prior turns and the new message, in original order.
        let mut history = Vec::new();
        for i in 0..3 {
            history.push(ChatTurn::user(format!("q{i}")));
            history.push(ChatTurn::assistant(format!("a{i}")));
        }
        history.push(ChatTurn::user("q3"));

        let turns = assemble(CHAT_SYSTEM_PROMPT, &history);
        assert_eq!(turns.len(), 8);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].content, "q0");
        assert_eq!(turns[2].content, "a0");
        assert_eq!(turns[5].content, "q2");
        assert_eq!(turns[6].content, "a2");
        assert_eq!(turns[7].content, "q3");
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }
}
