//! Terminal plotting (ASCII grids and bars).

pub mod ascii;

pub use ascii::*;
