//! Core of the ticker quote bot: configuration, quote lookup, and reply text.
//!
//! - **Config** (`config`) - layered defaults, TOML file, environment, overrides
//! - **Quotes** (`quote`) - snapshots, the [`QuoteSource`] seam, and the TWSE client
//! - **Intake** (`intake`) - ticker codes from message text
//! - **Reply** (`reply`) - user-facing text blocks
//! - **Service** (`service`) - message in, reply text out
//!
//! ```text
//! message text → intake → QuoteSource (per code) → reply → text
//! ```

pub mod config;
pub mod errors;
pub mod intake;
pub mod quote;
pub mod reply;
pub mod service;

pub use errors::QuoteFetchError;
pub use quote::{QuoteSnapshot, QuoteSource, RawQuote, TwseQuoteClient};
pub use service::QuoteReplyService;
