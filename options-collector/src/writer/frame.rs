//! Row batch to DataFrame conversion.

use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;

use crate::data::{GreekSource, Greeks};
use crate::normalize::{greek_column, FlattenedRow};

/// Timestamp format of the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Expiration format of the `lastTradeDateOrContractMonth` column.
pub const EXPIRY_FORMAT: &str = "%Y%m%d";

/// Build a DataFrame with the full column set, in write order.
pub fn rows_to_dataframe(rows: &[FlattenedRow]) -> PolarsResult<DataFrame> {
    let n = rows.len();

    let mut timestamp: Vec<String> = Vec::with_capacity(n);
    let mut con_id: Vec<i64> = Vec::with_capacity(n);
    let mut symbol: Vec<&str> = Vec::with_capacity(n);
    let mut expiry: Vec<String> = Vec::with_capacity(n);
    let mut strike: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut right: Vec<&str> = Vec::with_capacity(n);
    let mut multiplier: Vec<&str> = Vec::with_capacity(n);
    let mut currency: Vec<&str> = Vec::with_capacity(n);
    let mut time: Vec<Option<String>> = Vec::with_capacity(n);
    let mut und_price: Vec<Option<f64>> = Vec::with_capacity(n);

    for row in rows {
        timestamp.push(row.collected_at.format(TIMESTAMP_FORMAT).to_string());
        con_id.push(row.con_id);
        symbol.push(&row.symbol);
        expiry.push(row.expiration.format(EXPIRY_FORMAT).to_string());
        strike.push(row.strike.to_f64());
        right.push(row.right.as_str());
        multiplier.push(&row.multiplier);
        currency.push(&row.currency);
        time.push(row.time.map(|t| t.to_rfc3339()));
        und_price.push(row.und_price.to_f64());
    }

    let market = |name: &str, get: fn(&FlattenedRow) -> Option<f64>| -> Column {
        Series::new(name.into(), rows.iter().map(get).collect::<Vec<_>>()).into()
    };

    let mut columns: Vec<Column> = vec![
        Series::new("timestamp".into(), timestamp).into(),
        Series::new("conId".into(), con_id).into(),
        Series::new("symbol".into(), symbol).into(),
        Series::new("lastTradeDateOrContractMonth".into(), expiry).into(),
        Series::new("strike".into(), strike).into(),
        Series::new("right".into(), right).into(),
        Series::new("multiplier".into(), multiplier).into(),
        Series::new("currency".into(), currency).into(),
        Series::new("time".into(), time).into(),
        market("minTick", |r| r.min_tick),
        market("bid", |r| r.bid),
        market("bidSize", |r| r.bid_size),
        market("ask", |r| r.ask),
        market("askSize", |r| r.ask_size),
        market("last", |r| r.last),
        market("lastSize", |r| r.last_size),
        market("high", |r| r.high),
        market("low", |r| r.low),
        market("volume", |r| r.volume),
        market("close", |r| r.close),
        Series::new("undPrice".into(), und_price).into(),
    ];

    for source in GreekSource::ALL {
        for (idx, field) in Greeks::FIELD_NAMES.iter().enumerate() {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|r| r.greek_value(source, idx))
                .collect();
            columns.push(Series::new(greek_column(source, field).into(), values).into());
        }
    }

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionRight;
    use crate::normalize::column_names;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row() -> FlattenedRow {
        FlattenedRow {
            collected_at: NaiveDate::from_ymd_opt(2025, 6, 18)
                .unwrap()
                .and_hms_opt(10, 3, 0)
                .unwrap(),
            con_id: 42,
            symbol: "SPY".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
            strike: dec!(552.5),
            right: OptionRight::Call,
            multiplier: "100".to_string(),
            currency: "USD".to_string(),
            time: None,
            min_tick: Some(0.01),
            bid: Some(1.2),
            bid_size: Some(10.0),
            ask: Some(1.3),
            ask_size: Some(12.0),
            last: None,
            last_size: None,
            high: None,
            low: None,
            volume: None,
            close: Some(1.1),
            und_price: dec!(549.75),
            greeks: [None; 4],
        }
    }

    #[test]
    fn test_dataframe_schema_order() {
        let df = rows_to_dataframe(&[row(), row()]).unwrap();
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, column_names());
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_absent_values_are_null() {
        let df = rows_to_dataframe(&[row()]).unwrap();
        assert_eq!(df.column("last").unwrap().null_count(), 1);
        assert_eq!(df.column("bid_delta").unwrap().null_count(), 1);
        assert_eq!(df.column("model_undPrice").unwrap().null_count(), 1);
        assert_eq!(df.column("bid").unwrap().null_count(), 0);
    }
}
