use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/blenderbot-400M-distill";

/// Shown to the user for every chat failure, whatever the cause.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat API returned status {0}")]
    Status(u16),
    #[error("chat API response had no generated text")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: Conversation<'a>,
}

#[derive(Debug, Serialize)]
struct Conversation<'a> {
    text: &'a str,
    past_user_inputs: Vec<String>,
    generated_responses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    One(Generated),
    Many(Vec<Generated>),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        let generated = match self {
            InferenceResponse::One(g) => Some(g),
            InferenceResponse::Many(list) => list.into_iter().next(),
        };
        generated
            .and_then(|g| g.generated_text)
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, message: &str) -> Result<String, ChatError> {
        let body = InferenceRequest {
            inputs: Conversation {
                text: message,
                past_user_inputs: Vec::new(),
                generated_responses: Vec::new(),
            },
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let parsed: InferenceResponse = response.json().await?;
        parsed.into_text().ok_or(ChatError::EmptyReply)
    }
}
