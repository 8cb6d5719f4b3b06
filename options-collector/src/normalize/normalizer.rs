//! Quote record flattening.

use chrono::{DateTime, TimeZone};
use rust_decimal::Decimal;

use super::row::FlattenedRow;
use crate::data::{GreekSource, QuoteRecord};

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Flatten one quote into a row.
///
/// `reference_price` is the underlying price captured at the start of the
/// cycle and `collected_at` the cycle's collection instant in the exchange
/// timezone. Returns `None` when the quote has no contract binding.
pub fn normalize<T: TimeZone>(
    quote: &QuoteRecord,
    reference_price: Decimal,
    collected_at: &DateTime<T>,
) -> Option<FlattenedRow> {
    let contract = quote.contract.as_ref()?;

    Some(FlattenedRow {
        collected_at: collected_at.naive_local(),
        con_id: contract.con_id,
        symbol: contract.symbol.clone(),
        expiration: contract.expiration,
        strike: contract.strike,
        right: contract.right,
        multiplier: contract.multiplier.clone(),
        currency: contract.currency.clone(),
        time: quote.time,
        min_tick: finite(quote.min_tick),
        bid: finite(quote.bid),
        bid_size: finite(quote.bid_size),
        ask: finite(quote.ask),
        ask_size: finite(quote.ask_size),
        last: finite(quote.last),
        last_size: finite(quote.last_size),
        high: finite(quote.high),
        low: finite(quote.low),
        volume: finite(quote.volume),
        close: finite(quote.close),
        und_price: reference_price,
        greeks: GreekSource::ALL.map(|source| quote.greeks(source).copied()),
    })
}

/// Flatten a cycle's quotes, dropping those without a contract binding.
pub fn normalize_batch<T: TimeZone>(
    quotes: &[QuoteRecord],
    reference_price: Decimal,
    collected_at: &DateTime<T>,
) -> Vec<FlattenedRow> {
    quotes
        .iter()
        .filter_map(|q| normalize(q, reference_price, collected_at))
        .collect()
}
