use std::sync::Arc;

use tracing::info;

use crate::intake::{parse_ticker_codes, INVALID_INPUT_PROMPT};
use crate::quote::{QuoteSnapshot, QuoteSource};
use crate::reply::format_reply;

/// Turns one chat message into the reply text: intake, one lookup per code, formatting.
#[derive(Clone)]
pub struct QuoteReplyService {
    source: Arc<dyn QuoteSource>,
}

impl QuoteReplyService {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    pub async fn reply_to(&self, text: &str) -> String {
        let codes = parse_ticker_codes(text);
        if codes.is_empty() {
            info!(event_name = "quote.intake.no_codes", "message carried no ticker codes");
            return INVALID_INPUT_PROMPT.to_owned();
        }

        let mut results: Vec<(String, QuoteSnapshot)> = Vec::with_capacity(codes.len());
        for code in codes {
            let snapshot = self.source.fetch(&code).await;
            info!(
                event_name = "quote.lookup.completed",
                ticker = %code,
                has_quote = snapshot.has_quote(),
                "quote lookup completed"
            );
            results.push((code, snapshot));
        }

        format_reply(&results)
    }
}
