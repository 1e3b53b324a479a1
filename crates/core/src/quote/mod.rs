//! Quote snapshots and the sources that produce them.
//!
//! A [`QuoteSnapshot`] keeps the provider's price strings verbatim for display and derives
//! the change figures from them once, at construction time.

pub mod twse;

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};

pub use twse::TwseQuoteClient;

/// Placeholder the provider uses for a field it has no value for.
const PROVIDER_EMPTY_MARKER: &str = "-";
const DERIVED_DECIMAL_PLACES: u32 = 2;

/// Raw price fields as reported by a provider, before normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawQuote {
    pub open: Option<String>,
    pub high: Option<String>,
    pub low: Option<String>,
    pub previous_close: Option<String>,
    pub last_price: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuoteSnapshot {
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    previous_close: Option<String>,
    last_price: Option<String>,
    change: Option<Decimal>,
    change_percent: Option<Decimal>,
}

impl QuoteSnapshot {
    /// The canonical "no data" snapshot: every field absent.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: RawQuote) -> Self {
        let open = normalize_field(raw.open);
        let high = normalize_field(raw.high);
        let low = normalize_field(raw.low);
        let previous_close = normalize_field(raw.previous_close);
        let last_price = normalize_field(raw.last_price);

        let (change, change_percent) = match (&previous_close, &last_price) {
            (Some(previous_close), Some(last_price)) => derive_change(previous_close, last_price),
            _ => (None, None),
        };

        Self { open, high, low, previous_close, last_price, change, change_percent }
    }

    pub fn open(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn high(&self) -> Option<&str> {
        self.high.as_deref()
    }

    pub fn low(&self) -> Option<&str> {
        self.low.as_deref()
    }

    pub fn previous_close(&self) -> Option<&str> {
        self.previous_close.as_deref()
    }

    pub fn last_price(&self) -> Option<&str> {
        self.last_price.as_deref()
    }

    pub fn change(&self) -> Option<Decimal> {
        self.change
    }

    pub fn change_percent(&self) -> Option<Decimal> {
        self.change_percent
    }

    /// A snapshot without a last traded price carries no quote.
    pub fn has_quote(&self) -> bool {
        self.last_price.is_some()
    }
}

/// Anything that can turn a ticker code into a snapshot.
///
/// Implementations must not fail: every error path resolves to
/// [`QuoteSnapshot::unavailable`].
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self, code: &str) -> QuoteSnapshot;
}

fn normalize_field(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty() && value != PROVIDER_EMPTY_MARKER)
}

/// Both derived values or neither: a parse failure on either input drops the pair.
fn derive_change(previous_close: &str, last_price: &str) -> (Option<Decimal>, Option<Decimal>) {
    let (Some(previous), Some(last)) = (parse_price(previous_close), parse_price(last_price))
    else {
        return (None, None);
    };
    let Some(delta) = last.checked_sub(previous) else {
        return (None, None);
    };

    let change = round_derived(delta);
    let change_percent = if previous.is_zero() {
        None
    } else {
        delta
            .checked_div(previous)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(round_derived)
    };

    (Some(change), change_percent)
}

/// Parses a provider price, ignoring thousands separators.
pub(crate) fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(cleaned).or_else(|_| Decimal::from_scientific(cleaned)).ok()
}

/// Exact midpoints go to the even digit: a 0.1 tick on 80 is 0.125% and shows as 0.12%.
fn round_derived(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DERIVED_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}
