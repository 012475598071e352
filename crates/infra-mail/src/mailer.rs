// HTTP transactional-mail client.
//
// Delivery failures surface as MailError; the NotificationDispatcher
// above decides that they never fail a pipeline run.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use ticketflow_core::port::{Email, MailError, Mailer};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
    pub timeout: Duration,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8025/api/send".to_string(),
            api_key: String::new(),
            from: "support@ticketflow.local".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let request = SendRequest {
            from: &self.config.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{}: {}", status.as_u16(), body)));
        }

        debug!(to = %email.to, subject = %email.subject, "email delivered");
        Ok(())
    }
}
