//! Strike and expiration selection around a moving reference price.

pub mod selector;

pub use selector::{select_universe, Universe, UniverseSelector};
