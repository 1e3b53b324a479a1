use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tickerbot_core::config::{AppConfig, ConfigError};
use tickerbot_core::{QuoteFetchError, QuoteReplyService, TwseQuoteClient};
use tickerbot_line::{LineReplyClient, ReplyError};
use tracing::info;

use crate::{callback, health};

pub struct Application {
    pub config: AppConfig,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quote client setup failed: {0}")]
    QuoteClient(#[source] QuoteFetchError),
    #[error("line reply client setup failed: {0}")]
    ReplyClient(#[source] ReplyError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let quotes = TwseQuoteClient::new(&config.quote).map_err(BootstrapError::QuoteClient)?;
    info!(
        event_name = "system.bootstrap.quote_client_ready",
        correlation_id = "bootstrap",
        quote_base_url = %quotes.base_url(),
        timeout_secs = config.quote.timeout_secs,
        "quote client configured"
    );

    let sender =
        LineReplyClient::new(&config.line.api_base_url, config.line.channel_access_token.clone())
            .map_err(BootstrapError::ReplyClient)?;

    let state = callback::CallbackState::new(
        config.line.channel_secret.clone(),
        QuoteReplyService::new(Arc::new(quotes)),
        Arc::new(sender),
    );
    let router = callback::router(state).merge(health::router());

    Ok(Application { config, router })
}
