//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog records and grouping dimensions (`Record`, `Dimension`, `DimValue`)
//! - aggregation outputs (`CountSeries`, `CountTable`, `Aggregation`)
//! - forecast outputs (`YearSeries`, `ForecastSeries`, `TrendDirection`)
//! - queries and run configuration

pub mod types;

pub use types::*;
