use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use secrecy::SecretString;
use thiserror::Error;
use tickerbot_core::QuoteReplyService;
use tickerbot_line::{
    parse_events, signature::SIGNATURE_HEADER, InboundEvent, ReplyError, ReplySender,
    TextMessageEvent, WebhookError,
};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct CallbackState {
    channel_secret: SecretString,
    replies: QuoteReplyService,
    sender: Arc<dyn ReplySender>,
}

impl CallbackState {
    pub fn new(
        channel_secret: SecretString,
        replies: QuoteReplyService,
        sender: Arc<dyn ReplySender>,
    ) -> Self {
        Self { channel_secret, replies, sender }
    }
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error(transparent)]
    Reply(#[from] ReplyError),
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Webhook(_) => StatusCode::BAD_REQUEST,
            Self::Reply(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: CallbackState) -> Router {
    Router::new().route("/callback", post(callback)).with_state(state)
}

pub async fn callback(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, CallbackError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());

    let events = parse_events(&state.channel_secret, &body, signature).map_err(|error| {
        warn!(
            event_name = "ingress.line.webhook_rejected",
            has_signature = signature.is_some(),
            error = %error,
            "rejected line webhook"
        );
        error
    })?;

    info!(
        event_name = "ingress.line.webhook_received",
        event_count = events.len(),
        "received line webhook"
    );

    for event in events {
        match event {
            InboundEvent::TextMessage(message) => handle_text_message(&state, &message).await?,
            InboundEvent::Unsupported { event_type } => {
                debug!(
                    event_name = "ingress.line.event_ignored",
                    event_type = %event_type,
                    "ignoring unsupported line event"
                );
            }
        }
    }

    Ok("OK")
}

async fn handle_text_message(
    state: &CallbackState,
    message: &TextMessageEvent,
) -> Result<(), ReplyError> {
    let correlation_id = message.webhook_event_id.as_deref().unwrap_or("unknown");
    info!(
        event_name = "ingress.line.text_message",
        correlation_id,
        user_id = message.user_id.as_deref().unwrap_or("unknown"),
        "handling text message"
    );

    let reply = state.replies.reply_to(&message.text).await;

    state.sender.reply_text(&message.reply_token, &reply).await.map_err(|error| {
        warn!(
            event_name = "egress.line.reply_failed",
            correlation_id,
            error = %error,
            "failed to send line reply"
        );
        error
    })
}
