//! Data layer for the climbing log.
//!
//! Reads and appends sessions in the JSONL store, scopes them by climber
//! and date window, aggregates statistics, runs the report pipeline and
//! exports records.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod filters;
pub mod reader;

pub use climb_core as core;
