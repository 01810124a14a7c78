//! Core domain types and logic.

pub mod bar;
pub mod moving_average;
pub mod backtest;
pub mod regression;
pub mod forecast;
pub mod report;
pub mod error;
