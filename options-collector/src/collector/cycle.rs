//! One collection cycle: gate, fetch, normalize, persist.
//!
//! Failure handling:
//! - market closed is a skip, not an error
//! - any source failure abandons the cycle before anything is written
//! - an empty universe, qualification or quote set is reported as no data
//!   and performs no file I/O
//! - a failed write is returned to the caller; nothing is retried

use chrono::DateTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::{SessionCalendar, SessionStatus};
use crate::config::{CollectorConfig, ConfigError, ContractConfig};
use crate::data::{MarketDataSource, QuoteBatch, SourceError, UnderlyingQuote};
use crate::normalize::normalize_batch;
use crate::universe::UniverseSelector;
use crate::writer::{SnapshotWriter, WriteError, WriteOutcome};

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Market data source error: {0}")]
    Source(#[from] SourceError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("No option chain for trading class {trading_class} on {exchange}")]
    ChainNotFound {
        trading_class: String,
        exchange: String,
    },

    #[error("Invalid reference price {0}")]
    InvalidReferencePrice(Decimal),
}

/// Stage at which a cycle ran out of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataStage {
    /// No strike or no expiration survived selection.
    EmptyUniverse,
    /// The venue qualified none of the candidate contracts.
    NoContractsQualified,
    /// No quote produced a row.
    NoRows,
}

/// Counts for a cycle that wrote data.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub reference_price: Decimal,
    pub candidates: usize,
    pub qualified: usize,
    pub quotes: usize,
    /// Tickers the source rejected for a partial greek sub-record.
    pub rejected: usize,
    pub rows: usize,
    pub log_created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Skipped(SessionStatus),
    NoData(NoDataStage),
    Persisted(CycleReport),
}

/// What a connected session produced, before normalization.
enum Fetched {
    NoData(NoDataStage),
    Quotes {
        underlying: UnderlyingQuote,
        candidates: usize,
        qualified: usize,
        batch: QuoteBatch,
    },
}

/// Runs collection cycles for one underlying.
#[derive(Debug, Clone)]
pub struct Collector {
    contract: ContractConfig,
    selector: UniverseSelector,
    calendar: SessionCalendar,
    writer: SnapshotWriter,
}

impl Collector {
    pub fn new(
        contract: ContractConfig,
        selector: UniverseSelector,
        calendar: SessionCalendar,
        writer: SnapshotWriter,
    ) -> Self {
        Self {
            contract,
            selector,
            calendar,
            writer,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.contract.clone(),
            config.universe.selector(),
            config.session.calendar()?,
            SnapshotWriter::new(&config.output.log_path, &config.output.latest_path),
        ))
    }

    pub fn calendar(&self) -> &SessionCalendar {
        &self.calendar
    }

    pub fn writer(&self) -> &SnapshotWriter {
        &self.writer
    }

    /// Run one cycle if the session is open at `now`.
    pub async fn run_cycle<S>(&self, source: &mut S, now: DateTime<Tz>) -> Result<CycleOutcome, CycleError>
    where
        S: MarketDataSource + ?Sized,
    {
        let status = self.calendar.session_status(&now);
        if !status.is_open() {
            info!(%now, "{}, skipping collection", status);
            return Ok(CycleOutcome::Skipped(status));
        }
        self.collect(source, now).await
    }

    /// Run one cycle regardless of the session calendar.
    pub async fn collect<S>(&self, source: &mut S, now: DateTime<Tz>) -> Result<CycleOutcome, CycleError>
    where
        S: MarketDataSource + ?Sized,
    {
        info!(symbol = %self.contract.symbol, "starting options collection");

        source.connect().await?;
        let fetched = self.fetch(source).await;
        let closed = source.disconnect().await;

        if let Err(e) = closed {
            warn!(error = %e, "disconnect failed");
        }
        let fetched = fetched?;

        let (underlying, candidates, qualified, batch) = match fetched {
            Fetched::NoData(stage) => {
                info!(?stage, "no data collected");
                return Ok(CycleOutcome::NoData(stage));
            }
            Fetched::Quotes {
                underlying,
                candidates,
                qualified,
                batch,
            } => (underlying, candidates, qualified, batch),
        };
        let quotes = &batch.quotes;
        if batch.rejected > 0 {
            warn!(rejected = batch.rejected, "tickers rejected for partial greeks");
        }

        let rows = normalize_batch(quotes, underlying.reference_price, &now);
        if rows.len() < quotes.len() {
            debug!(dropped = quotes.len() - rows.len(), "quotes without contract binding dropped");
        }

        match self.writer.persist(&rows)? {
            WriteOutcome::Empty => {
                info!("no data collected");
                Ok(CycleOutcome::NoData(NoDataStage::NoRows))
            }
            WriteOutcome::Written { rows, log_created } => {
                info!(
                    rows,
                    log_created,
                    log = %self.writer.log_path().display(),
                    latest = %self.writer.latest_path().display(),
                    "persisted snapshot"
                );
                Ok(CycleOutcome::Persisted(CycleReport {
                    reference_price: underlying.reference_price,
                    candidates,
                    qualified,
                    quotes: quotes.len(),
                    rejected: batch.rejected,
                    rows,
                    log_created,
                }))
            }
        }
    }

    async fn fetch<S>(&self, source: &mut S) -> Result<Fetched, CycleError>
    where
        S: MarketDataSource + ?Sized,
    {
        let contract = &self.contract;

        let underlying = source
            .underlying_quote(&contract.symbol, &contract.exchange, &contract.currency)
            .await?;
        if underlying.reference_price <= Decimal::ZERO {
            return Err(CycleError::InvalidReferencePrice(underlying.reference_price));
        }
        info!(symbol = %underlying.symbol, price = %underlying.reference_price, "underlying quote");

        let chains = source.option_chains(&underlying).await?;
        let chain = chains
            .into_iter()
            .find(|c| c.trading_class == contract.trading_class && c.exchange == contract.exchange)
            .ok_or_else(|| CycleError::ChainNotFound {
                trading_class: contract.trading_class.clone(),
                exchange: contract.exchange.clone(),
            })?;

        let universe = self
            .selector
            .select(underlying.reference_price, &chain.strikes, &chain.expirations);
        info!(
            strikes = universe.strikes.len(),
            expirations = universe.expirations.len(),
            "universe selected"
        );
        if universe.is_empty() {
            return Ok(Fetched::NoData(NoDataStage::EmptyUniverse));
        }

        let specs =
            universe.contract_specs(&contract.symbol, &contract.exchange, &contract.trading_class);
        let contracts = source.qualify(&specs).await?;
        info!(
            qualified = contracts.len(),
            candidates = specs.len(),
            "contracts qualified"
        );
        if contracts.is_empty() {
            return Ok(Fetched::NoData(NoDataStage::NoContractsQualified));
        }

        let batch = source.fetch_quotes(&contracts).await?;
        info!(
            quotes = batch.quotes.len(),
            rejected = batch.rejected,
            "quotes received"
        );

        Ok(Fetched::Quotes {
            underlying,
            candidates: specs.len(),
            qualified: contracts.len(),
            batch,
        })
    }
}
