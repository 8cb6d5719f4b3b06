//! Persistence of flattened rows: cumulative log plus latest snapshot.

pub mod csv_log;
pub mod frame;
pub mod inspect;

pub use csv_log::{persist, SnapshotWriter, WriteError, WriteOutcome};
pub use frame::{rows_to_dataframe, EXPIRY_FORMAT, TIMESTAMP_FORMAT};
pub use inspect::{inspect_log, LogSummary};
