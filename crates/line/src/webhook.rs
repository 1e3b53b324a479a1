use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::signature;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    TextMessage(TextMessageEvent),
    Unsupported { event_type: String },
}

impl InboundEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::TextMessage(_) => "message/text",
            Self::Unsupported { event_type } => event_type,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub reply_token: String,
    pub text: String,
    pub user_id: Option<String>,
    pub webhook_event_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    webhook_event_id: Option<String>,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Verifies `signature` over `body` and decodes the events it carries, in delivery order.
///
/// A missing signature is treated exactly like a wrong one. Nothing in the body is looked
/// at until the signature has been checked.
pub fn parse_events(
    channel_secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<Vec<InboundEvent>, WebhookError> {
    let signature = signature.ok_or(WebhookError::InvalidSignature)?;
    if !signature::is_valid(channel_secret.expose_secret().as_bytes(), body, signature) {
        return Err(WebhookError::InvalidSignature);
    }

    let body: WebhookBody = serde_json::from_slice(body)?;
    Ok(body.events.into_iter().map(into_inbound).collect())
}

fn into_inbound(event: RawEvent) -> InboundEvent {
    let RawEvent { event_type, reply_token, webhook_event_id, source, message } = event;
    if event_type != "message" {
        return InboundEvent::Unsupported { event_type };
    }

    let Some(message) = message else {
        return InboundEvent::Unsupported { event_type };
    };
    if message.message_type != "text" {
        return InboundEvent::Unsupported {
            event_type: format!("{event_type}/{}", message.message_type),
        };
    }

    match (reply_token, message.text) {
        (Some(reply_token), Some(text)) => InboundEvent::TextMessage(TextMessageEvent {
            reply_token,
            text,
            user_id: source.and_then(|source| source.user_id),
            webhook_event_id,
        }),
        _ => InboundEvent::Unsupported { event_type: format!("{event_type}/text") },
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{parse_events, InboundEvent, TextMessageEvent, WebhookError};
    use crate::signature::sign;

    const SECRET: &str = "channel-secret";

    fn secret() -> SecretString {
        SECRET.to_owned().into()
    }

    fn signed(body: &str) -> String {
        sign(SECRET.as_bytes(), body.as_bytes()).expect("any key length is accepted")
    }

    const MIXED_BODY: &str = r#"{
        "destination": "Uxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx",
        "events": [
            {
                "type": "message",
                "mode": "active",
                "timestamp": 1718000000000,
                "webhookEventId": "01HZZZ",
                "replyToken": "reply-1",
                "source": {"type": "user", "userId": "U123"},
                "message": {"id": "1", "type": "text", "text": "2330,0050"}
            },
            {
                "type": "message",
                "replyToken": "reply-2",
                "source": {"type": "user", "userId": "U123"},
                "message": {"id": "2", "type": "sticker", "packageId": "1", "stickerId": "1"}
            },
            {
                "type": "follow",
                "replyToken": "reply-3",
                "source": {"type": "user", "userId": "U456"}
            }
        ]
    }"#;

    #[test]
    fn decodes_text_messages_and_marks_the_rest_unsupported() {
        let events =
            parse_events(&secret(), MIXED_BODY.as_bytes(), Some(&signed(MIXED_BODY))).expect("ok");

        assert_eq!(
            events,
            vec![
                InboundEvent::TextMessage(TextMessageEvent {
                    reply_token: "reply-1".to_owned(),
                    text: "2330,0050".to_owned(),
                    user_id: Some("U123".to_owned()),
                    webhook_event_id: Some("01HZZZ".to_owned()),
                }),
                InboundEvent::Unsupported { event_type: "message/sticker".to_owned() },
                InboundEvent::Unsupported { event_type: "follow".to_owned() },
            ]
        );
        assert_eq!(events[0].event_type(), "message/text");
    }

    #[test]
    fn verification_ping_has_no_events() {
        let body = r#"{"destination":"U0","events":[]}"#;
        let events = parse_events(&secret(), body.as_bytes(), Some(&signed(body))).expect("ok");
        assert!(events.is_empty());
    }

    #[test]
    fn missing_signature_is_invalid() {
        let error = parse_events(&secret(), MIXED_BODY.as_bytes(), None).expect_err("unsigned");
        assert!(matches!(error, WebhookError::InvalidSignature));
    }

    #[test]
    fn wrong_signature_is_invalid_even_for_malformed_bodies() {
        let error =
            parse_events(&secret(), b"not json", Some("AAAA")).expect_err("signature is wrong");
        assert!(matches!(error, WebhookError::InvalidSignature));
    }

    #[test]
    fn signed_garbage_is_malformed() {
        let body = "not json";
        let error =
            parse_events(&secret(), body.as_bytes(), Some(&signed(body))).expect_err("bad body");
        assert!(matches!(error, WebhookError::MalformedBody(_)));
    }

    #[test]
    fn text_message_without_reply_token_is_unsupported() {
        let body = r#"{"events":[{"type":"message","mode":"standby","message":{"type":"text","text":"2330"}}]}"#;
        let events = parse_events(&secret(), body.as_bytes(), Some(&signed(body))).expect("ok");
        assert_eq!(events, vec![InboundEvent::Unsupported { event_type: "message/text".to_owned() }]);
    }
}
