use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tickerbot_core::config::{default_config_paths, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::resolve(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_load",
                format!("config could not be loaded: {error}"),
                2,
            );
        }
    };

    let file_path = detect_config_path();
    let sources = SourceLookup { doc: load_config_file_doc(file_path.as_deref()), file_path };

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(sources.render(
        "line.channel_secret",
        &redact_secret(config.line.channel_secret.expose_secret()),
        &["TICKERBOT_LINE_CHANNEL_SECRET", "LINE_CHANNEL_SECRET"],
    ));
    lines.push(sources.render(
        "line.channel_access_token",
        &redact_secret(config.line.channel_access_token.expose_secret()),
        &["TICKERBOT_LINE_CHANNEL_ACCESS_TOKEN", "LINE_CHANNEL_ACCESS_TOKEN"],
    ));
    lines.push(sources.render(
        "line.api_base_url",
        &config.line.api_base_url,
        &["TICKERBOT_LINE_API_BASE_URL"],
    ));

    lines.push(sources.render("quote.base_url", &config.quote.base_url, &["TICKERBOT_QUOTE_BASE_URL"]));
    lines.push(sources.render(
        "quote.timeout_secs",
        &config.quote.timeout_secs.to_string(),
        &["TICKERBOT_QUOTE_TIMEOUT_SECS"],
    ));

    lines.push(sources.render(
        "server.bind_address",
        &config.server.bind_address,
        &["TICKERBOT_SERVER_BIND_ADDRESS"],
    ));
    lines.push(sources.render(
        "server.port",
        &config.server.port.to_string(),
        &["TICKERBOT_SERVER_PORT", "PORT"],
    ));

    lines.push(sources.render(
        "logging.level",
        &config.logging.level,
        &["TICKERBOT_LOGGING_LEVEL", "TICKERBOT_LOG_LEVEL"],
    ));
    lines.push(sources.render(
        "logging.format",
        &format!("{:?}", config.logging.format),
        &["TICKERBOT_LOGGING_FORMAT", "TICKERBOT_LOG_FORMAT"],
    ));

    let exit_code = match config.validate() {
        Ok(()) => {
            lines.push("validation: ok".to_string());
            0
        }
        Err(error) => {
            lines.push(format!("validation: failed: {error}"));
            2
        }
    };

    CommandResult { exit_code, output: lines.join("\n") }
}

struct SourceLookup {
    doc: Option<Value>,
    file_path: Option<PathBuf>,
}

impl SourceLookup {
    fn render(&self, key_path: &str, value: &str, env_keys: &[&str]) -> String {
        format!("- {key_path} = {value} (source: {})", self.field_source(key_path, env_keys))
    }

    /// First env key set wins, matching the order the loader consults them in.
    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env_is_set(key)) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn env_is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn detect_config_path() -> Option<PathBuf> {
    default_config_paths().into_iter().find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<unset>".to_string();
    }

    format!("<redacted, {} chars>", trimmed.chars().count())
}
