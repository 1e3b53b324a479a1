use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::QuoteConfig;
use crate::errors::QuoteFetchError;
use crate::quote::{QuoteSnapshot, QuoteSource, RawQuote};

/// Client for the TWSE market information system `getStockInfo.jsp` endpoint.
#[derive(Clone, Debug)]
pub struct TwseQuoteClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct StockInfoResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<StockInfoItem>,
}

#[derive(Debug, Default, Deserialize)]
struct StockInfoItem {
    #[serde(rename = "o", default)]
    open: Option<String>,
    #[serde(rename = "h", default)]
    high: Option<String>,
    #[serde(rename = "l", default)]
    low: Option<String>,
    #[serde(rename = "y", default)]
    previous_close: Option<String>,
    #[serde(rename = "z", default)]
    last_price: Option<String>,
}

impl From<StockInfoItem> for RawQuote {
    fn from(item: StockInfoItem) -> Self {
        Self {
            open: item.open,
            high: item.high,
            low: item.low,
            previous_close: item.previous_close,
            last_price: item.last_price,
        }
    }
}

impl TwseQuoteClient {
    pub fn new(config: &QuoteConfig) -> Result<Self, QuoteFetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(QuoteFetchError::ClientBuild)?;

        Ok(Self { client, base_url: config.base_url.clone() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange channel parameter for a listed (`tse`) ticker.
    fn exchange_channel(code: &str) -> String {
        format!("tse_{code}.tw")
    }

    pub async fn try_fetch(&self, code: &str) -> Result<QuoteSnapshot, QuoteFetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("ex_ch", Self::exchange_channel(code))])
            .send()
            .await
            .map_err(QuoteFetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteFetchError::Status { status: status.as_u16() });
        }

        let body = response.text().await.map_err(QuoteFetchError::Body)?;
        debug!(
            event_name = "quote.provider.payload",
            ticker = code,
            payload = %body,
            "quote provider raw payload"
        );

        parse_stock_info(&body)
    }
}

/// Decodes a `getStockInfo.jsp` body into a snapshot for its first (only) item.
pub(crate) fn parse_stock_info(body: &str) -> Result<QuoteSnapshot, QuoteFetchError> {
    let response: StockInfoResponse = serde_json::from_str(body)?;

    Ok(response
        .msg_array
        .into_iter()
        .next()
        .map(|item| QuoteSnapshot::from_raw(item.into()))
        .unwrap_or_else(QuoteSnapshot::unavailable))
}

#[async_trait]
impl QuoteSource for TwseQuoteClient {
    async fn fetch(&self, code: &str) -> QuoteSnapshot {
        match self.try_fetch(code).await {
            Ok(snapshot) => {
                if !snapshot.has_quote() {
                    debug!(
                        event_name = "quote.provider.no_trade",
                        ticker = code,
                        "provider returned no last price"
                    );
                }
                snapshot
            }
            Err(error) => {
                warn!(
                    event_name = "quote.provider.failed",
                    ticker = code,
                    error_kind = error.kind(),
                    error = %error,
                    "quote lookup failed; replying without data"
                );
                QuoteSnapshot::unavailable()
            }
        }
    }
}
