pub mod gateway;
pub mod source;
pub mod types;

pub use gateway::{quote_batch, GatewayClient, RawChain, RawContract, RawGreeks, RawTicker, RawUnderlying};
pub use source::{MarketDataSource, SourceError};
pub use types::{
    ChainParams, Contract, ContractSpec, GreekSource, Greeks, GreeksError, OptionRight,
    QuoteBatch, QuoteRecord, UnderlyingQuote,
};
