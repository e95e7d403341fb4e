// Chat completion wire types and provider errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a completion provider reports in a form callers can branch on
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API rejected the call for exceeding its rate limit
    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: String },

    /// Any other non-success HTTP response
    #[error("{provider} API request failed\n\nStatus: {status}\nBody: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    /// The response parsed but carried no completion text
    #[error("{provider} returned no choices in response")]
    EmptyResponse { provider: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible `/v1/chat/completions` request body
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            max_tokens: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"ok"}}]}"#).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("ok"));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Api {
            provider: "mistral".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        assert!(err.to_string().contains("Status: 500"));
    }
}
