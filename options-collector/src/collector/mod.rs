//! Collection cycle orchestration and scheduling.

pub mod cycle;
pub mod scheduler;

#[cfg(test)]
mod fake;

pub use cycle::{Collector, CycleError, CycleOutcome, CycleReport, NoDataStage};
pub use scheduler::{Scheduler, SchedulerStats};
