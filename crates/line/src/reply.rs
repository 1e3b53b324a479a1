use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const REPLY_PATH: &str = "/v2/bot/message/reply";
const REPLY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply http client could not be built: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("reply request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("reply rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sends reply text for an inbound event's reply token.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), ReplyError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    message_type: &'static str,
    text: &'a str,
}

#[derive(Clone, Debug)]
pub struct LineReplyClient {
    client: Client,
    reply_url: String,
    access_token: SecretString,
}

impl LineReplyClient {
    pub fn new(api_base_url: &str, access_token: SecretString) -> Result<Self, ReplyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REPLY_TIMEOUT_SECS))
            .build()
            .map_err(ReplyError::ClientBuild)?;
        let reply_url = format!("{}{REPLY_PATH}", api_base_url.trim_end_matches('/'));

        Ok(Self { client, reply_url, access_token })
    }
}

#[async_trait]
impl ReplySender for LineReplyClient {
    async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), ReplyError> {
        let request = ReplyRequest {
            reply_token,
            messages: [TextMessage { message_type: "text", text }],
        };

        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(ReplyError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::Rejected { status: status.as_u16(), body });
        }

        debug!(event_name = "egress.line.reply_sent", status = status.as_u16(), "reply delivered");
        Ok(())
    }
}
