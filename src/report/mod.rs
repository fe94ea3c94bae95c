//! Reporting utilities: business insights and formatted terminal output.

pub mod format;
pub mod insight;

pub use format::*;
pub use insight::*;
