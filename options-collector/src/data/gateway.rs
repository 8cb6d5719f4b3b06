//! HTTP client for a broker gateway bridge.
//!
//! The bridge fronts a TWS / IB Gateway session and exposes it as JSON:
//! - `POST /session` opens a broker session, `DELETE /session/{id}` closes it
//! - `GET /underlying` and `GET /chains` describe the underlying
//! - `POST /qualify` and `POST /tickers` resolve and quote option contracts
//!
//! Every response is wrapped in `{"data": ...}`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::source::{MarketDataSource, SourceError};
use super::types::{
    ChainParams, Contract, ContractSpec, Greeks, GreeksError, OptionRight, QuoteBatch,
    QuoteRecord, UnderlyingQuote,
};
use crate::config::GatewayConfig;

/// Date format the venue uses for expirations.
const EXPIRY_FORMAT: &str = "%Y%m%d";

/// API response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    host: &'a str,
    port: u16,
    client_id: i32,
}

/// Underlying quote as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUnderlying {
    pub symbol: String,
    pub con_id: i64,
    #[serde(default)]
    pub market_price: Option<f64>,
}

/// Option chain parameters as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChain {
    pub exchange: String,
    pub trading_class: String,
    #[serde(default)]
    pub multiplier: String,
    #[serde(default)]
    pub expirations: Vec<String>,
    #[serde(default)]
    pub strikes: Vec<f64>,
}

impl RawChain {
    /// Convert to chain parameters, skipping unparseable entries.
    pub fn to_params(&self) -> ChainParams {
        ChainParams {
            exchange: self.exchange.clone(),
            trading_class: self.trading_class.clone(),
            multiplier: self.multiplier.clone(),
            strikes: self
                .strikes
                .iter()
                .filter_map(|s| Decimal::try_from(*s).ok())
                .collect(),
            expirations: self
                .expirations
                .iter()
                .filter_map(|e| NaiveDate::parse_from_str(e, EXPIRY_FORMAT).ok())
                .collect(),
        }
    }
}

/// Contract as returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContract {
    pub con_id: i64,
    pub symbol: String,
    pub last_trade_date_or_contract_month: String,
    pub strike: f64,
    pub right: String,
    #[serde(default)]
    pub multiplier: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub local_symbol: String,
    #[serde(default)]
    pub trading_class: String,
}

impl RawContract {
    /// Convert to a qualified contract. `None` when the identity is unusable.
    pub fn to_contract(&self) -> Option<Contract> {
        if self.con_id <= 0 {
            return None;
        }
        Some(Contract {
            con_id: self.con_id,
            symbol: self.symbol.clone(),
            expiration: NaiveDate::parse_from_str(
                &self.last_trade_date_or_contract_month,
                EXPIRY_FORMAT,
            )
            .ok()?,
            strike: Decimal::try_from(self.strike).ok()?,
            right: OptionRight::from_str(&self.right)?,
            multiplier: self.multiplier.clone(),
            exchange: self.exchange.clone(),
            currency: self.currency.clone(),
            local_symbol: self.local_symbol.clone(),
            trading_class: self.trading_class.clone(),
        })
    }
}

/// Greek sub-record as returned by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGreeks {
    #[serde(default)]
    pub implied_vol: Option<f64>,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub opt_price: Option<f64>,
    #[serde(default)]
    pub pv_dividend: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub vega: Option<f64>,
    #[serde(default)]
    pub theta: Option<f64>,
    #[serde(default)]
    pub und_price: Option<f64>,
}

impl RawGreeks {
    fn to_greeks(&self) -> Result<Option<Greeks>, GreeksError> {
        Greeks::from_parts([
            self.implied_vol,
            self.delta,
            self.opt_price,
            self.pv_dividend,
            self.gamma,
            self.vega,
            self.theta,
            self.und_price,
        ])
    }
}

fn convert_greeks(raw: &Option<RawGreeks>) -> Result<Option<Greeks>, GreeksError> {
    match raw {
        Some(g) => g.to_greeks(),
        None => Ok(None),
    }
}

/// Ticker snapshot as returned by the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicker {
    #[serde(default)]
    pub contract: Option<RawContract>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub min_tick: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub bid_size: Option<f64>,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub ask_size: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub last_size: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub bid_greeks: Option<RawGreeks>,
    #[serde(default)]
    pub ask_greeks: Option<RawGreeks>,
    #[serde(default)]
    pub last_greeks: Option<RawGreeks>,
    #[serde(default)]
    pub model_greeks: Option<RawGreeks>,
}

impl RawTicker {
    /// Convert to a quote record.
    ///
    /// Fails only on a partially populated greek sub-record.
    pub fn to_quote(&self) -> Result<QuoteRecord, GreeksError> {
        Ok(QuoteRecord {
            contract: self.contract.as_ref().and_then(RawContract::to_contract),
            time: self
                .time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
            min_tick: self.min_tick,
            bid: self.bid,
            bid_size: self.bid_size,
            ask: self.ask,
            ask_size: self.ask_size,
            last: self.last,
            last_size: self.last_size,
            high: self.high,
            low: self.low,
            volume: self.volume,
            close: self.close,
            bid_greeks: convert_greeks(&self.bid_greeks)?,
            ask_greeks: convert_greeks(&self.ask_greeks)?,
            last_greeks: convert_greeks(&self.last_greeks)?,
            model_greeks: convert_greeks(&self.model_greeks)?,
        })
    }
}

/// Convert gateway tickers, counting those with a partial greek sub-record
/// as rejected.
pub fn quote_batch(raw: &[RawTicker]) -> QuoteBatch {
    let mut batch = QuoteBatch {
        quotes: Vec::with_capacity(raw.len()),
        rejected: 0,
    };
    for ticker in raw {
        match ticker.to_quote() {
            Ok(quote) => batch.quotes.push(quote),
            Err(e) => {
                let con_id = ticker.contract.as_ref().map(|c| c.con_id);
                warn!(?con_id, error = %e, "rejecting ticker with partial greeks");
                batch.rejected += 1;
            }
        }
    }
    batch
}

/// Contract specification in gateway wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSpec<'a> {
    sec_type: &'static str,
    symbol: &'a str,
    last_trade_date_or_contract_month: String,
    strike: f64,
    right: &'static str,
    exchange: &'a str,
    trading_class: &'a str,
}

impl<'a> WireSpec<'a> {
    fn from_spec(spec: &'a ContractSpec) -> Self {
        Self {
            sec_type: "OPT",
            symbol: &spec.symbol,
            last_trade_date_or_contract_month: spec.expiration.format(EXPIRY_FORMAT).to_string(),
            strike: spec.strike.to_f64().unwrap_or_default(),
            right: spec.right.as_str(),
            exchange: &spec.exchange,
            trading_class: &spec.trading_class,
        }
    }
}

#[derive(Debug, Serialize)]
struct QualifyRequest<'a> {
    contracts: Vec<WireSpec<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TickersRequest {
    con_ids: Vec<i64>,
}

/// Broker gateway client.
pub struct GatewayClient {
    client: Client,
    base_url: String,
    host: String,
    port: u16,
    client_id: i32,
    session: Option<String>,
    request_count: u64,
}

impl GatewayClient {
    /// Create a new gateway client. No session is opened until `connect`.
    pub fn new(config: &GatewayConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: config.host.clone(),
            port: config.port,
            client_id: config.client_id,
            session: None,
            request_count: 0,
        })
    }

    /// Get request count for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn session_id(&self) -> Result<&str, SourceError> {
        self.session.as_deref().ok_or(SourceError::NotConnected)
    }

    async fn send<T: DeserializeOwned>(&mut self, request: RequestBuilder) -> Result<T, SourceError> {
        let response = request.send().await?;
        self.request_count += 1;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!("{}: {}", status, text)));
        }

        let wrapped: ApiResponse<T> = response.json().await.map_err(|e| {
            SourceError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;
        Ok(wrapped.data)
    }
}

#[async_trait]
impl MarketDataSource for GatewayClient {
    async fn connect(&mut self) -> Result<(), SourceError> {
        let body = SessionRequest {
            host: &self.host,
            port: self.port,
            client_id: self.client_id,
        };
        let request = self.client.post(self.url("session")).json(&body);
        let info: SessionInfo = self.send(request).await.map_err(|e| match e {
            SourceError::Http(err) => SourceError::Connection(err.to_string()),
            other => other,
        })?;

        debug!(session = %info.session_id, "gateway session opened");
        self.session = Some(info.session_id);
        Ok(())
    }

    async fn underlying_quote(
        &mut self,
        symbol: &str,
        exchange: &str,
        currency: &str,
    ) -> Result<UnderlyingQuote, SourceError> {
        let session = self.session_id()?.to_string();
        let request = self.client.get(self.url("underlying")).query(&[
            ("session", session.as_str()),
            ("symbol", symbol),
            ("exchange", exchange),
            ("currency", currency),
        ]);
        let raw: RawUnderlying = self.send(request).await?;

        let price = raw
            .market_price
            .filter(|p| p.is_finite())
            .ok_or_else(|| SourceError::InvalidResponse(format!("no market price for {}", symbol)))?;
        let reference_price = Decimal::try_from(price)
            .map_err(|e| SourceError::InvalidResponse(format!("bad market price {}: {}", price, e)))?;

        Ok(UnderlyingQuote {
            symbol: raw.symbol,
            con_id: raw.con_id,
            reference_price,
        })
    }

    async fn option_chains(
        &mut self,
        underlying: &UnderlyingQuote,
    ) -> Result<Vec<ChainParams>, SourceError> {
        let session = self.session_id()?.to_string();
        let con_id = underlying.con_id.to_string();
        let request = self.client.get(self.url("chains")).query(&[
            ("session", session.as_str()),
            ("symbol", underlying.symbol.as_str()),
            ("conId", con_id.as_str()),
            ("secType", "STK"),
        ]);
        let raw: Vec<RawChain> = self.send(request).await?;
        Ok(raw.iter().map(RawChain::to_params).collect())
    }

    async fn qualify(&mut self, specs: &[ContractSpec]) -> Result<Vec<Contract>, SourceError> {
        let session = self.session_id()?.to_string();
        let body = QualifyRequest {
            contracts: specs.iter().map(WireSpec::from_spec).collect(),
        };
        let request = self
            .client
            .post(self.url("qualify"))
            .query(&[("session", session.as_str())])
            .json(&body);
        let raw: Vec<RawContract> = self.send(request).await?;
        Ok(raw.iter().filter_map(RawContract::to_contract).collect())
    }

    async fn fetch_quotes(&mut self, contracts: &[Contract]) -> Result<QuoteBatch, SourceError> {
        let session = self.session_id()?.to_string();
        let body = TickersRequest {
            con_ids: contracts.iter().map(|c| c.con_id).collect(),
        };
        let request = self
            .client
            .post(self.url("tickers"))
            .query(&[("session", session.as_str())])
            .json(&body);
        let raw: Vec<RawTicker> = self.send(request).await?;
        Ok(quote_batch(&raw))
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let request = self.client.delete(self.url(&format!("session/{}", session)));
        let _: serde_json::Value = self.send(request).await?;
        debug!(%session, "gateway session closed");
        Ok(())
    }
}
