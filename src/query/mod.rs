//! Query engine: filtering, aggregation and chart selection.

pub mod aggregate;
pub mod chart;
pub mod filter;

pub use aggregate::*;
pub use chart::*;
pub use filter::*;
