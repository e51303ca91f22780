//! Fill costs and margin rules shared by every risk policy.

use super::error::ScalptraderError;

/// Account-level execution parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub initial_cash: f64,
    /// Margin fraction per unit of notional (1/50 for 50:1 leverage).
    pub leverage: f64,
    pub base_size: f64,
    pub commission_per_trade: f64,
    pub commission_rate: f64,
    pub allow_same_bar_reentry: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            initial_cash: 100.0,
            leverage: 1.0 / 50.0,
            base_size: 0.2,
            commission_per_trade: 0.0,
            commission_rate: 0.0,
            allow_same_bar_reentry: false,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ScalptraderError> {
        if !(self.initial_cash > 0.0) {
            return Err(ScalptraderError::config_invalid(
                "account",
                "initial_cash",
                "initial_cash must be positive",
            ));
        }
        if !(self.leverage > 0.0 && self.leverage <= 1.0) {
            return Err(ScalptraderError::config_invalid(
                "account",
                "leverage",
                "leverage must be in (0, 1]",
            ));
        }
        if !(self.base_size > 0.0) {
            return Err(ScalptraderError::config_invalid(
                "account",
                "base_size",
                "base_size must be positive",
            ));
        }
        if !(self.commission_per_trade >= 0.0) {
            return Err(ScalptraderError::config_invalid(
                "account",
                "commission_per_trade",
                "commission_per_trade must be non-negative",
            ));
        }
        if !(self.commission_rate >= 0.0) {
            return Err(ScalptraderError::config_invalid(
                "account",
                "commission_rate",
                "commission_rate must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Round-trip commission: flat fee + rate * (entry notional + exit notional).
pub fn calculate_commission(entry_notional: f64, exit_notional: f64, config: &ExecutionConfig) -> f64 {
    config.commission_per_trade + config.commission_rate * (entry_notional + exit_notional)
}

/// Margin locked by a position of `size` units at `price`.
pub fn margin_required(price: f64, size: f64, config: &ExecutionConfig) -> f64 {
    price * size * config.leverage
}
