use std::time::Instant;

use secrecy::ExposeSecret;
use serde::Serialize;
use tickerbot_core::config::{AppConfig, LoadOptions};
use tickerbot_core::TwseQuoteClient;

use crate::commands::{current_thread_runtime, escape_json, CommandResult};

/// Ticker used to probe the quote provider.
const PROBE_TICKER: &str = "2330";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded and validated; LINE channel secret ({} chars) and access token set, replies go to `{}`",
                    config.line.channel_secret.expose_secret().trim().chars().count(),
                    config.line.api_base_url
                ),
            });
            checks.push(check_quote_provider(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "quote_provider",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_quote_provider(config: &AppConfig) -> DoctorCheck {
    let client = match TwseQuoteClient::new(&config.quote) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "quote_provider",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "quote_provider",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let started = Instant::now();
    let result = runtime.block_on(client.try_fetch(PROBE_TICKER));
    let elapsed_ms = started.elapsed().as_millis();

    match result {
        Ok(snapshot) => {
            let trading = if snapshot.has_quote() { "has a last price" } else { "has no trade yet" };
            DoctorCheck {
                name: "quote_provider",
                status: CheckStatus::Pass,
                details: format!(
                    "`{}` answered for {PROBE_TICKER} in {elapsed_ms}ms ({trading})",
                    client.base_url()
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "quote_provider",
            status: CheckStatus::Fail,
            details: format!("`{}` probe failed ({}): {error}", client.base_url(), error.kind()),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
