pub mod calendar;
pub mod collector;
pub mod config;
pub mod data;
pub mod normalize;
pub mod universe;
pub mod writer;

// Re-export commonly used types
pub use calendar::{SessionCalendar, SessionStatus};
pub use collector::{Collector, CycleError, CycleOutcome, CycleReport, Scheduler, SchedulerStats};
pub use config::{CollectorConfig, ConfigError};
pub use data::{GatewayClient, MarketDataSource, QuoteRecord, SourceError};
pub use normalize::{normalize, normalize_batch, FlattenedRow};
pub use universe::{select_universe, Universe, UniverseSelector};
pub use writer::{inspect_log, persist, SnapshotWriter, WriteError, WriteOutcome};
