use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::llm::{classify_send_error, ensure_success, join_url, read_json, ModelClient};

const API_VERSION: &str = "2023-06-01";

pub struct ClaudeClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
}

impl ClaudeClient {
    pub fn new(client: Client, config: &ModelConfig) -> Self {
        Self {
            client,
            url: join_url(config.endpoint(), "messages"),
            api_key: config.api_key.clone(),
            model: config.name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        }
    }

    pub async fn send_message(&self, request: &MessagesRequest) -> Result<MessagesResponse> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| classify_send_error(e, self.timeout_secs))?;

        let response = ensure_success(response).await?;
        read_json(response, self.timeout_secs).await
    }
}

#[async_trait]
impl ModelClient for ClaudeClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self.send_message(&request).await?;

        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "Claude response"
        );

        if response.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!("Claude response hit max_tokens limit");
        }

        let text = extract_text(&response.content);
        if text.trim().is_empty() {
            return Err(AppError::Model(format!(
                "Response {} contained no text",
                response.id
            )));
        }
        Ok(text)
    }
}

// --- Request types ---

#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

// --- Response types ---

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

fn extract_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(|block| {
            if let ContentBlock::Text { text } = block {
                Some(text.as_str())
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_skips_non_text_blocks() {
        let body = r#"{
            "id": "msg_01",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "first"},
                {"type": "text", "text": "second"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }"#;

        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(&response.content), "first\nsecond");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_request_serializes_system_separately() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            system: "be terse".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["system"], "be terse");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }
}
