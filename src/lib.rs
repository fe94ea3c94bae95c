//! `fashion-trends` library crate.
//!
//! The binary (`ft`) is a thin wrapper around this library so that:
//!
//! - the explore / forecast pipelines are testable without spawning processes
//! - the TUI and the one-shot commands share the same query code
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod plot;
pub mod query;
pub mod report;
pub mod tui;
