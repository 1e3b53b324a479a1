//! Ticker code extraction from free-form message text.

/// Reply sent when a message contains no usable ticker code.
pub const INVALID_INPUT_PROMPT: &str = "請輸入正確的台股代號，例如「2330」或「2330,0050」";

const CODE_SEPARATOR: char = ',';

/// Splits `text` on commas and keeps the all-digit tokens, in message order.
///
/// Anything else is dropped without comment. Repeated codes are kept so each one is
/// looked up and answered on its own.
pub fn parse_ticker_codes(text: &str) -> Vec<String> {
    text.trim()
        .split(CODE_SEPARATOR)
        .map(str::trim)
        .filter(|token| is_ticker_code(token))
        .map(str::to_owned)
        .collect()
}

/// ASCII digits only. Full-width forms such as `２３３０` are not ticker codes here and get the
/// prompt, since the exchange only knows the ASCII spelling.
fn is_ticker_code(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}
