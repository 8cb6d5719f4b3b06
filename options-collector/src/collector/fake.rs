//! In-memory market data source for cycle and scheduler tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::data::{
    ChainParams, Contract, ContractSpec, Greeks, MarketDataSource, QuoteBatch, QuoteRecord,
    SourceError, UnderlyingQuote,
};

pub struct FakeSource {
    pub price: Decimal,
    pub strikes: Vec<Decimal>,
    pub expirations: Vec<NaiveDate>,
    pub trading_class: String,
    /// Strikes the venue refuses to qualify.
    pub unlisted: HashSet<Decimal>,
    /// Contract ids whose ticker comes back without a contract binding.
    pub unbound: HashSet<i64>,
    /// Contract ids whose ticker is rejected for a partial greek sub-record.
    pub rejected: HashSet<i64>,
    pub fail_connect: bool,
    pub fail_fetch: bool,
    pub fail_disconnect: bool,
    pub calls: Vec<&'static str>,
    pub connected: bool,
}

impl FakeSource {
    pub fn new(price: Decimal, strikes: Vec<Decimal>, expirations: Vec<NaiveDate>) -> Self {
        Self {
            price,
            strikes,
            expirations,
            trading_class: "SPY".to_string(),
            unlisted: HashSet::new(),
            unbound: HashSet::new(),
            rejected: HashSet::new(),
            fail_connect: false,
            fail_fetch: false,
            fail_disconnect: false,
            calls: Vec::new(),
            connected: false,
        }
    }

    pub fn expirations(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2025, 7, d).unwrap())
            .collect()
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn connect(&mut self) -> Result<(), SourceError> {
        self.calls.push("connect");
        if self.fail_connect {
            return Err(SourceError::Connection("refused".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn underlying_quote(
        &mut self,
        symbol: &str,
        _exchange: &str,
        _currency: &str,
    ) -> Result<UnderlyingQuote, SourceError> {
        self.calls.push("underlying");
        Ok(UnderlyingQuote {
            symbol: symbol.to_string(),
            con_id: 756733,
            reference_price: self.price,
        })
    }

    async fn option_chains(
        &mut self,
        _underlying: &UnderlyingQuote,
    ) -> Result<Vec<ChainParams>, SourceError> {
        self.calls.push("chains");
        Ok(vec![
            ChainParams {
                exchange: "CBOE".to_string(),
                trading_class: self.trading_class.clone(),
                multiplier: "100".to_string(),
                strikes: vec![],
                expirations: vec![],
            },
            ChainParams {
                exchange: "SMART".to_string(),
                trading_class: self.trading_class.clone(),
                multiplier: "100".to_string(),
                strikes: self.strikes.clone(),
                expirations: self.expirations.clone(),
            },
        ])
    }

    async fn qualify(&mut self, specs: &[ContractSpec]) -> Result<Vec<Contract>, SourceError> {
        self.calls.push("qualify");
        Ok(specs
            .iter()
            .filter(|s| !self.unlisted.contains(&s.strike))
            .enumerate()
            .map(|(i, s)| Contract {
                con_id: 1000 + i as i64,
                symbol: s.symbol.clone(),
                expiration: s.expiration,
                strike: s.strike,
                right: s.right,
                multiplier: "100".to_string(),
                exchange: s.exchange.clone(),
                currency: "USD".to_string(),
                local_symbol: String::new(),
                trading_class: s.trading_class.clone(),
            })
            .collect())
    }

    async fn fetch_quotes(&mut self, contracts: &[Contract]) -> Result<QuoteBatch, SourceError> {
        self.calls.push("fetch");
        if self.fail_fetch {
            return Err(SourceError::Connection("connection dropped".to_string()));
        }
        let (kept, refused): (Vec<&Contract>, Vec<&Contract>) = contracts
            .iter()
            .partition(|c| !self.rejected.contains(&c.con_id));
        let quotes = kept
            .into_iter()
            .map(|c| QuoteRecord {
                contract: (!self.unbound.contains(&c.con_id)).then(|| c.clone()),
                bid: Some(1.0),
                ask: Some(1.1),
                model_greeks: (c.con_id % 2 == 0).then_some(Greeks {
                    implied_vol: 0.2,
                    delta: 0.5,
                    opt_price: 1.05,
                    pv_dividend: 0.0,
                    gamma: 0.01,
                    vega: 0.1,
                    theta: -0.05,
                    und_price: 500.0,
                }),
                ..Default::default()
            })
            .collect();
        Ok(QuoteBatch {
            quotes,
            rejected: refused.len(),
        })
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        self.calls.push("disconnect");
        self.connected = false;
        if self.fail_disconnect {
            return Err(SourceError::Api("session already closed".to_string()));
        }
        Ok(())
    }
}
