// OpenAI-compatible chat-completions analysis provider.
//
// The provider returns the raw JSON the model produced; validation and
// fallback live in the core AnalysisClient, so this layer only has to
// get bytes across the wire and off again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ticketflow_core::domain::RawAnalysis;
use ticketflow_core::port::{AnalysisProvider, ProviderError};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a support-ticket triage assistant. \
Classify the ticket and respond with a single JSON object, no prose, with keys: \
category (one of technical, billing, account, feature_request, bug, general, other), \
priority (one of low, medium, high), \
summary (one sentence, max 500 characters), \
tags (array of up to 5 short lowercase strings), \
required_skills (array of up to 5 short lowercase strings).";

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpAnalysisProvider {
    client: reqwest::Client,
    config: AiConfig,
}

impl HttpAnalysisProvider {
    pub fn new(config: AiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn analyze(
        &self,
        subject: &str,
        description: &str,
        user_category: &str,
    ) -> Result<RawAnalysis, ProviderError> {
        let prompt = format!(
            "Subject: {subject}\nUser-selected category: {user_category}\n\nDescription:\n{description}"
        );
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status(status.as_u16(), body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("empty choices".to_string()))?;

        debug!(model = %self.config.model, "analysis response received");

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| ProviderError::Malformed(format!("{e}: {content}")))?;

        Ok(RawAnalysis::new(value))
    }
}
