//! Flattened row schema.
//!
//! One row per quoted contract with a fixed column set:
//! - collection timestamp
//! - contract identity (conId, symbol, expiry, strike, right, multiplier, currency)
//! - top of book and the cycle's underlying reference price
//! - 4 × 8 greek columns, `{bid,ask,last,model}_{field}`
//!
//! Missing values are nulls, never zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::data::{GreekSource, Greeks, OptionRight};

/// Contract identity columns, after `timestamp`.
pub const IDENTITY_COLUMNS: &[&str] = &[
    "conId",
    "symbol",
    "lastTradeDateOrContractMonth",
    "strike",
    "right",
    "multiplier",
    "currency",
];

/// Quote columns, after the identity columns.
pub const MARKET_COLUMNS: &[&str] = &[
    "time", "minTick", "bid", "bidSize", "ask", "askSize", "last", "lastSize", "high", "low",
    "volume", "close", "undPrice",
];

/// Total number of columns in a row.
pub const COLUMN_COUNT: usize =
    1 + IDENTITY_COLUMNS.len() + MARKET_COLUMNS.len() + GreekSource::ALL.len() * Greeks::FIELD_NAMES.len();

/// Column name for one greek field of one source, e.g. `bid_impliedVol`.
pub fn greek_column(source: GreekSource, field: &str) -> String {
    format!("{}_{}", source.prefix(), field)
}

/// All column names in write order.
pub fn column_names() -> Vec<String> {
    let mut names = Vec::with_capacity(COLUMN_COUNT);
    names.push("timestamp".to_string());
    names.extend(IDENTITY_COLUMNS.iter().map(|c| c.to_string()));
    names.extend(MARKET_COLUMNS.iter().map(|c| c.to_string()));
    for source in GreekSource::ALL {
        for field in Greeks::FIELD_NAMES {
            names.push(greek_column(source, field));
        }
    }
    names
}

/// One persisted row. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedRow {
    /// Cycle collection time, exchange-local wall clock.
    pub collected_at: NaiveDateTime,
    pub con_id: i64,
    pub symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub multiplier: String,
    pub currency: String,
    pub time: Option<DateTime<Utc>>,
    pub min_tick: Option<f64>,
    pub bid: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask: Option<f64>,
    pub ask_size: Option<f64>,
    pub last: Option<f64>,
    pub last_size: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
    pub close: Option<f64>,
    pub und_price: Decimal,
    /// Greek sub-records in [`GreekSource::ALL`] order.
    pub greeks: [Option<Greeks>; 4],
}

impl FlattenedRow {
    pub fn greeks(&self, source: GreekSource) -> Option<&Greeks> {
        self.greeks[source.index()].as_ref()
    }

    /// Value of one greek column, `None` when the source was absent.
    pub fn greek_value(&self, source: GreekSource, field_idx: usize) -> Option<f64> {
        self.greeks(source)
            .and_then(|g| g.values().get(field_idx).copied())
    }
}
