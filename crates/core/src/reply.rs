//! User-facing reply text for quote lookups.

use rust_decimal::Decimal;

use crate::quote::QuoteSnapshot;

/// Shown in place of any absent value.
pub const MISSING_VALUE: &str = "—";
const BLOCK_SEPARATOR: &str = "\n\n";

pub fn format_block(code: &str, snapshot: &QuoteSnapshot) -> String {
    let Some(last_price) = snapshot.last_price() else {
        return format!("{code} 找不到即時報價或尚未成交。");
    };

    let open = snapshot.open().unwrap_or(MISSING_VALUE);
    let high = snapshot.high().unwrap_or(MISSING_VALUE);
    let low = snapshot.low().unwrap_or(MISSING_VALUE);
    let previous_close = snapshot.previous_close().unwrap_or(MISSING_VALUE);
    let change = signed(snapshot.change(), "");
    let change_percent = signed(snapshot.change_percent(), "%");

    format!(
        "{code} 開盤價：{open} 元\n      當日最高：{high} 元\n      當日最低：{low} 元\n      昨收價：{previous_close} 元\n      最新成交：{last_price} 元\n      漲跌值：{change} 元\n      漲跌幅：{change_percent}"
    )
}

pub fn format_reply<S>(results: &[(S, QuoteSnapshot)]) -> String
where
    S: AsRef<str>,
{
    results
        .iter()
        .map(|(code, snapshot)| format_block(code.as_ref(), snapshot))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

fn signed(value: Option<Decimal>, suffix: &str) -> String {
    match value {
        Some(value) => format!("{value:+.2}{suffix}"),
        None => MISSING_VALUE.to_owned(),
    }
}
