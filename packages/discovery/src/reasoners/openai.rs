//! OpenAI implementation of the Reasoner trait.
//!
//! Chat completions over `reqwest`, one system message per role,
//! temperature 0.
//!
//! # Example
//!
//! ```rust,ignore
//! use discovery::reasoners::OpenAiReasoner;
//!
//! let reasoner = OpenAiReasoner::from_env()?.with_model("gpt-4o-mini");
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::security::ReasonerCredentials;
use crate::traits::reasoner::{Reasoner, Role};

const SEARCH_SYSTEM: &str = "You are a financial research assistant. You locate official, \
authoritative documents (annual reports, regulator filings) and answer with JSON only.";

const JUDGE_SYSTEM: &str = "You are a strict validator of financial sources. You evaluate \
each rubric check independently and answer with JSON only.";

const REFINE_SYSTEM: &str = "You are an expert in prompt engineering. You return only the \
improved prompt text, without commentary.";

/// OpenAI-based reasoner.
#[derive(Clone)]
pub struct OpenAiReasoner {
    client: Client,
    credentials: ReasonerCredentials,
    max_tokens: u32,
}

impl OpenAiReasoner {
    pub fn new(credentials: ReasonerCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            max_tokens: 2048,
        }
    }

    /// Create from `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ReasonerCredentials::from_env()?))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.credentials.model = model.into();
        self
    }

    /// Use a preconfigured HTTP client (proxies, custom TLS).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.credentials.model
    }

    fn system_prompt(role: Role) -> &'static str {
        match role {
            Role::Search => SEARCH_SYSTEM,
            Role::Judge => JUDGE_SYSTEM,
            Role::Refine => REFINE_SYSTEM,
        }
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn invoke(&self, prompt: &str, role: Role) -> Result<String> {
        let request = ChatRequest {
            model: self.credentials.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(role).to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.credentials.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.api_key.expose()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DiscoveryError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::transport(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Transport(Box::new(e)))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| DiscoveryError::transport("No response content from OpenAI"))?;

        tracing::debug!(
            role = %role,
            model = %self.credentials.model,
            len = content.len(),
            "Reasoner answered"
        );
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
