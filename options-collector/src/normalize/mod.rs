//! Flattening of fetched quotes into fixed-schema rows.

pub mod normalizer;
pub mod row;

pub use normalizer::{normalize, normalize_batch};
pub use row::{column_names, greek_column, FlattenedRow, COLUMN_COUNT, IDENTITY_COLUMNS, MARKET_COLUMNS};
