//! stocklens — daily stock price analysis: moving-average strategy
//! backtesting and linear-regression forecasting with report generation.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
