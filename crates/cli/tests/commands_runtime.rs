use std::env;
use std::sync::{Mutex, OnceLock};

use axum::{http::StatusCode, routing::get, Router};
use serde_json::Value;
use tickerbot_cli::commands::{config, doctor, lookup};

const TSMC_BODY: &str = r#"{"msgArray":[{"c":"2330","o":"580.0000","h":"585.0000","l":"578.0000","y":"580.0000","z":"583.0000"}],"rtcode":"0000"}"#;

const LINE_SECRETS: [(&str, &str); 2] = [
    ("TICKERBOT_LINE_CHANNEL_SECRET", "channel-secret-value"),
    ("TICKERBOT_LINE_CHANNEL_ACCESS_TOKEN", "access-token-value"),
];

#[test]
fn lookup_prints_formatted_reply_from_provider() {
    let (_runtime, base_url) = spawn_quote_stub(StatusCode::OK, TSMC_BODY);

    with_env(&[("TICKERBOT_QUOTE_BASE_URL", base_url.as_str())], || {
        let result = lookup::run("2330");
        assert_eq!(result.exit_code, 0);
        assert_eq!(
            result.output,
            "2330 開盤價：580.0000 元\n      當日最高：585.0000 元\n      當日最低：578.0000 元\n      昨收價：580.0000 元\n      最新成交：583.0000 元\n      漲跌值：+3.00 元\n      漲跌幅：+0.52%"
        );
    });
}

#[test]
fn lookup_rejects_non_ticker_text_with_the_prompt() {
    with_env(&[("TICKERBOT_QUOTE_BASE_URL", "http://127.0.0.1:9/unused")], || {
        let result = lookup::run("hello");
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output, "請輸入正確的台股代號，例如「2330」或「2330,0050」");
    });
}

#[test]
fn lookup_reports_missing_quote_when_provider_fails() {
    let (_runtime, base_url) = spawn_quote_stub(StatusCode::SERVICE_UNAVAILABLE, "busy");

    with_env(&[("TICKERBOT_QUOTE_BASE_URL", base_url.as_str())], || {
        let result = lookup::run("2330,0050");
        assert_eq!(result.exit_code, 0);
        assert_eq!(
            result.output,
            "2330 找不到即時報價或尚未成交。\n\n0050 找不到即時報價或尚未成交。"
        );
    });
}

#[test]
fn lookup_does_not_need_line_credentials_but_validates_quote_config() {
    with_env(&[("TICKERBOT_QUOTE_BASE_URL", "ftp://example.invalid")], || {
        let result = lookup::run("2330");
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "lookup");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_fails_and_skips_provider_check_without_line_credentials() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["name"], "quote_provider");
        assert_eq!(report["checks"][1]["status"], "skipped");
        assert_eq!(report["checks"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn doctor_passes_when_provider_answers() {
    let (_runtime, base_url) = spawn_quote_stub(StatusCode::OK, TSMC_BODY);
    let mut vars = LINE_SECRETS.to_vec();
    vars.push(("TICKERBOT_QUOTE_BASE_URL", base_url.as_str()));

    with_env(&vars, || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 0, "unexpected report:\n{}", result.output);
        assert!(result.output.starts_with("doctor: all readiness checks passed"));
        assert!(result.output.contains("- [ok] quote_provider:"));
        assert!(result.output.contains("channel secret (20 chars)"));
        assert!(!result.output.contains("line_credentials"));
        assert!(!result.output.contains("channel-secret-value"));
    });
}

#[test]
fn doctor_flags_unhealthy_provider() {
    let (_runtime, base_url) = spawn_quote_stub(StatusCode::BAD_GATEWAY, "down");
    let mut vars = LINE_SECRETS.to_vec();
    vars.push(("TICKERBOT_QUOTE_BASE_URL", base_url.as_str()));

    with_env(&vars, || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["checks"][0]["status"], "pass");
        assert_eq!(report["checks"][1]["status"], "fail");
        let details = report["checks"][1]["details"].as_str().expect("details string");
        assert!(details.contains("status"), "details: {details}");
    });
}

#[test]
fn config_attributes_sources_and_redacts_secrets() {
    let vars = [
        ("LINE_CHANNEL_SECRET", "channel-secret-value"),
        ("TICKERBOT_LINE_CHANNEL_ACCESS_TOKEN", "access-token-value"),
        ("PORT", "8080"),
    ];

    with_env(&vars, || {
        let result = config::run();
        assert_eq!(result.exit_code, 0, "unexpected output:\n{}", result.output);

        let output = &result.output;
        assert!(output.contains(
            "- line.channel_secret = <redacted, 20 chars> (source: env (LINE_CHANNEL_SECRET))"
        ));
        assert!(output.contains("(source: env (TICKERBOT_LINE_CHANNEL_ACCESS_TOKEN))"));
        assert!(output.contains("- server.port = 8080 (source: env (PORT))"));
        assert!(output.contains("- quote.timeout_secs = 5 (source: default)"));
        assert!(output.ends_with("validation: ok"));
        assert!(!output.contains("channel-secret-value"));
        assert!(!output.contains("access-token-value"));
    });
}

#[test]
fn config_reports_validation_failure_without_secrets() {
    with_env(&[], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("- line.channel_secret = <unset> (source: default)"));
        assert!(result.output.contains("validation: failed:"));
    });
}

fn spawn_quote_stub(status: StatusCode, body: &'static str) -> (tokio::runtime::Runtime, String) {
    let runtime = tokio::runtime::Runtime::new().expect("stub runtime should start");
    let listener = runtime
        .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
        .expect("stub listener should bind");
    let address = listener.local_addr().expect("stub address");

    let router = Router::new()
        .route("/stock/api/getStockInfo.jsp", get(move || async move { (status, body) }));
    runtime.spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    (runtime, format!("http://{address}/stock/api/getStockInfo.jsp"))
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "TICKERBOT_LINE_CHANNEL_SECRET",
        "TICKERBOT_LINE_CHANNEL_ACCESS_TOKEN",
        "TICKERBOT_LINE_API_BASE_URL",
        "LINE_CHANNEL_SECRET",
        "LINE_CHANNEL_ACCESS_TOKEN",
        "TICKERBOT_QUOTE_BASE_URL",
        "TICKERBOT_QUOTE_TIMEOUT_SECS",
        "TICKERBOT_SERVER_BIND_ADDRESS",
        "TICKERBOT_SERVER_PORT",
        "PORT",
        "TICKERBOT_LOGGING_LEVEL",
        "TICKERBOT_LOGGING_FORMAT",
        "TICKERBOT_LOG_LEVEL",
        "TICKERBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
