//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - per-source catalog cache (`cache`)
//! - view exports (CSV/JSON) (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
