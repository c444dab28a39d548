//! Shared utilities for the visa approval pipeline crates.
//!
//! This crate provides the type-tolerant column readers used by ingestion,
//! transformation and inference.

pub mod polars;

pub use polars::{column_f64, column_i64, column_strings};
