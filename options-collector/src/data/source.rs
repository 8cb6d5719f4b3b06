//! Market data source capability.
//!
//! The collection cycle talks to the broker only through this trait, so the
//! transport can be swapped (HTTP gateway in production, in-memory fakes in
//! tests).

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ChainParams, Contract, ContractSpec, QuoteBatch, UnderlyingQuote};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not connected to market data source")]
    NotConnected,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Broker session used by one collection cycle.
///
/// A cycle calls `connect` first and `disconnect` last; the session is not
/// held open between cycles.
#[async_trait]
pub trait MarketDataSource: Send {
    /// Open the broker session.
    async fn connect(&mut self) -> Result<(), SourceError>;

    /// Fetch the underlying's reference quote.
    async fn underlying_quote(
        &mut self,
        symbol: &str,
        exchange: &str,
        currency: &str,
    ) -> Result<UnderlyingQuote, SourceError>;

    /// List option chain parameters for the underlying, one entry per
    /// exchange/trading class.
    async fn option_chains(
        &mut self,
        underlying: &UnderlyingQuote,
    ) -> Result<Vec<ChainParams>, SourceError>;

    /// Resolve specifications to venue contracts. Invalid specifications
    /// are dropped, not reported as errors.
    async fn qualify(&mut self, specs: &[ContractSpec]) -> Result<Vec<Contract>, SourceError>;

    /// Fetch one quote per qualified contract. Tickers rejected for bad data
    /// are counted in the batch instead of failing the call.
    async fn fetch_quotes(&mut self, contracts: &[Contract]) -> Result<QuoteBatch, SourceError>;

    /// Close the broker session.
    async fn disconnect(&mut self) -> Result<(), SourceError>;
}
