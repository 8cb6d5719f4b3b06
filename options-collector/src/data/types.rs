//! Core data types for options chain collection.
//!
//! These types model what the venue reports for a single underlying:
//! the underlying quote, the chain parameters, contract specifications
//! before and after qualification, and per-contract quote records with
//! their optional greek sub-records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionRight {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl OptionRight {
    /// Enumeration order used when building a universe.
    pub const ALL: [OptionRight; 2] = [OptionRight::Call, OptionRight::Put];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "C" | "CALL" => Some(Self::Call),
            "P" | "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }
}

/// Pricing source a greek sub-record was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GreekSource {
    Bid,
    Ask,
    Last,
    Model,
}

impl GreekSource {
    /// Column order of the four sources in a flattened row.
    pub const ALL: [GreekSource; 4] = [
        GreekSource::Bid,
        GreekSource::Ask,
        GreekSource::Last,
        GreekSource::Model,
    ];

    /// Position in [`GreekSource::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Bid => 0,
            Self::Ask => 1,
            Self::Last => 2,
            Self::Model => 3,
        }
    }

    /// Column prefix for this source.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
            Self::Last => "last",
            Self::Model => "model",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GreeksError {
    #[error("partial greek sub-record, missing {missing:?}")]
    Partial { missing: Vec<&'static str> },
}

/// One fully populated greek sub-record.
///
/// A venue either reports all eight values for a source or none of them.
/// Construct from wire data with [`Greeks::from_parts`], which refuses
/// partially populated records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub implied_vol: f64,
    pub delta: f64,
    pub opt_price: f64,
    pub pv_dividend: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    /// Underlying price the venue used for this computation.
    pub und_price: f64,
}

impl Greeks {
    /// Field names in column order.
    pub const FIELD_NAMES: [&'static str; 8] = [
        "impliedVol",
        "delta",
        "optPrice",
        "pvDividend",
        "gamma",
        "vega",
        "theta",
        "undPrice",
    ];

    /// Values in the order of [`Greeks::FIELD_NAMES`].
    pub fn values(&self) -> [f64; 8] {
        [
            self.implied_vol,
            self.delta,
            self.opt_price,
            self.pv_dividend,
            self.gamma,
            self.vega,
            self.theta,
            self.und_price,
        ]
    }

    /// Build from optional parts given in [`Greeks::FIELD_NAMES`] order.
    ///
    /// All empty yields `Ok(None)`, all populated yields `Ok(Some(..))`.
    /// Anything in between is a data-quality error. Non-finite values count
    /// as empty.
    pub fn from_parts(parts: [Option<f64>; 8]) -> Result<Option<Self>, GreeksError> {
        let parts = parts.map(|v| v.filter(|x| x.is_finite()));
        let missing: Vec<&'static str> = parts
            .iter()
            .zip(Self::FIELD_NAMES)
            .filter(|(v, _)| v.is_none())
            .map(|(_, name)| name)
            .collect();

        match (missing.len(), parts) {
            (8, _) => Ok(None),
            (
                0,
                [Some(implied_vol), Some(delta), Some(opt_price), Some(pv_dividend), Some(gamma), Some(vega), Some(theta), Some(und_price)],
            ) => Ok(Some(Self {
                implied_vol,
                delta,
                opt_price,
                pv_dividend,
                gamma,
                vega,
                theta,
                und_price,
            })),
            _ => Err(GreeksError::Partial { missing }),
        }
    }
}

/// Underlying reference quote, fetched once per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingQuote {
    pub symbol: String,
    /// Venue contract id of the underlying, needed for chain lookups.
    pub con_id: i64,
    pub reference_price: Decimal,
}

/// Strikes and expirations the venue lists for one exchange/trading class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    pub exchange: String,
    pub trading_class: String,
    pub multiplier: String,
    pub strikes: Vec<Decimal>,
    pub expirations: Vec<NaiveDate>,
}

/// An option contract specification prior to qualification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractSpec {
    pub symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub exchange: String,
    pub trading_class: String,
}

/// A contract the venue has qualified, with its full identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub con_id: i64,
    pub symbol: String,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub multiplier: String,
    pub exchange: String,
    pub currency: String,
    pub local_symbol: String,
    pub trading_class: String,
}

/// A single fetched option quote.
///
/// Every market field is optional: the venue leaves fields unset when no
/// trade or computation has happened yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRecord {
    /// Contract binding; `None` when the venue returned no contract.
    pub contract: Option<Contract>,
    /// Venue timestamp of the quote.
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
    pub bid_greeks: Option<Greeks>,
    pub ask_greeks: Option<Greeks>,
    pub last_greeks: Option<Greeks>,
    pub model_greeks: Option<Greeks>,
}

impl QuoteRecord {
    /// Greek sub-record for a source, if the venue computed one.
    pub fn greeks(&self, source: GreekSource) -> Option<&Greeks> {
        match source {
            GreekSource::Bid => self.bid_greeks.as_ref(),
            GreekSource::Ask => self.ask_greeks.as_ref(),
            GreekSource::Last => self.last_greeks.as_ref(),
            GreekSource::Model => self.model_greeks.as_ref(),
        }
    }
}

/// Quotes returned for one fetch, plus the count of tickers the source
/// refused because of a data-quality error (a partial greek sub-record).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteBatch {
    pub quotes: Vec<QuoteRecord>,
    pub rejected: usize,
}
