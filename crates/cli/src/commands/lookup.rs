use std::sync::Arc;

use tickerbot_core::config::{AppConfig, LoadOptions};
use tickerbot_core::{QuoteReplyService, TwseQuoteClient};

use crate::commands::{current_thread_runtime, CommandResult};

/// Runs `text` through the same intake, lookup, and formatting path a webhook message takes.
/// Only the quote section of the config has to be valid; LINE credentials are not needed.
pub fn run(text: &str) -> CommandResult {
    let config = match AppConfig::resolve(LoadOptions::default())
        .and_then(|config| config.quote.validate().map(|()| config))
    {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "lookup",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let client = match TwseQuoteClient::new(&config.quote) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("lookup", "client_build", error.to_string(), 3);
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "lookup",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let service = QuoteReplyService::new(Arc::new(client));
    CommandResult::text(runtime.block_on(service.reply_to(text)))
}
