//! LINE Messaging API integration.
//!
//! - **Signature** (`signature`) - `X-Line-Signature` HMAC-SHA256 verification
//! - **Webhook** (`webhook`) - signed request body → ordered list of [`webhook::InboundEvent`]
//! - **Reply** (`reply`) - reply-token text messages via the Messaging API
//!
//! ```text
//! POST /callback → parse_events (verify + decode) → handler → ReplySender
//! ```

pub mod reply;
pub mod signature;
pub mod webhook;

pub use reply::{LineReplyClient, ReplyError, ReplySender};
pub use webhook::{parse_events, InboundEvent, TextMessageEvent, WebhookError};
