//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod trend;
pub mod signal;
pub mod position;
pub mod execution;
pub mod account;
pub mod risk;
pub mod simulator;
pub mod backtest;
pub mod metrics;
pub mod error;
