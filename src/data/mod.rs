//! Data sources beyond the catalog CSV (synthetic sample generation).

pub mod sample;

pub use sample::*;
