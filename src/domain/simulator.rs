//! Bar-by-bar position simulator.
//!
//! Per bar, in order:
//! 1. With a position open, test the policy's exits against the bar; survivors
//!    get their stop moved by the policy.
//! 2. When flat (and not just closed, unless same-bar re-entry is allowed),
//!    open on a Buy/Sell signal at the bar's close.
//! 3. On the last bar, force-close anything still open at the close.
//!
//! Equity is sampled at every bar's close.

use tracing::{debug, warn};

use super::account::AccountState;
use super::error::ScalptraderError;
use super::execution::{self, ExecutionConfig};
use super::ohlcv::Bar;
use super::position::{ClosedTrade, Direction, ExitReason, Position};
use super::risk::{PolicyKind, RiskPolicy};
use super::signal::Signal;

/// Outcome of one policy run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub policy: PolicyKind,
    pub account: AccountState,
    /// Direction held at each bar's close.
    pub exposure: Vec<Option<Direction>>,
    /// Stop-loss level held at each bar's close.
    pub stop_levels: Vec<Option<f64>>,
    /// Bars where a signal arrived while flat but no entry was taken.
    pub skipped_entries: usize,
}

impl SimulationResult {
    pub fn trades(&self) -> &[ClosedTrade] {
        &self.account.closed_trades
    }
}

pub struct Simulator {
    policy: Box<dyn RiskPolicy + Send>,
    config: ExecutionConfig,
    account: AccountState,
    position: Option<Position>,
    skipped_entries: usize,
}

impl Simulator {
    /// Fails with `ConfigInvalid` when `config` does not validate.
    pub fn new(policy: Box<dyn RiskPolicy + Send>, config: ExecutionConfig) -> Result<Self, ScalptraderError> {
        config.validate()?;
        let account = AccountState::new(config.initial_cash, config.leverage);
        Ok(Simulator {
            policy,
            config,
            account,
            position: None,
            skipped_entries: 0,
        })
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    /// Replay `signals` over `bars`. Both must have the same length.
    pub fn run(mut self, bars: &[Bar], signals: &[Signal]) -> Result<SimulationResult, ScalptraderError> {
        if bars.len() != signals.len() {
            return Err(ScalptraderError::LengthMismatch {
                bars: bars.len(),
                signals: signals.len(),
            });
        }

        let mut exposure = Vec::with_capacity(bars.len());
        let mut stop_levels = Vec::with_capacity(bars.len());

        for (i, (bar, &signal)) in bars.iter().zip(signals).enumerate() {
            self.step(i, bar, signal)?;

            exposure.push(self.position.as_ref().map(|p| p.direction));
            stop_levels.push(self.position.as_ref().map(|p| p.stop_loss));

            if i + 1 == bars.len() && self.position.is_some() {
                self.close_position(i, bar, bar.close, ExitReason::EndOfData)?;
            }

            let equity = self.equity_at(bar.close);
            self.account.record_equity(bar.timestamp, equity);
        }

        Ok(SimulationResult {
            policy: self.policy.kind(),
            account: self.account,
            exposure,
            stop_levels,
            skipped_entries: self.skipped_entries,
        })
    }

    /// Process one bar: exits first, then entries.
    pub fn step(&mut self, index: usize, bar: &Bar, signal: Signal) -> Result<(), ScalptraderError> {
        let mut closed_this_bar = false;

        if let Some(position) = self.position.as_ref() {
            match self.exit_for(position, bar, signal) {
                Some((price, reason)) => {
                    self.close_position(index, bar, price, reason)?;
                    closed_this_bar = true;
                }
                None => {
                    if let Some(stop) = self.policy.on_bar_update(position, bar) {
                        if let Some(p) = self.position.as_mut() {
                            p.stop_loss = stop;
                        }
                    }
                }
            }
        }

        if self.position.is_none() && (!closed_this_bar || self.config.allow_same_bar_reentry) {
            self.try_open(index, bar, signal)?;
        }

        Ok(())
    }

    fn exit_for(&self, position: &Position, bar: &Bar, signal: Signal) -> Option<(f64, ExitReason)> {
        // Stop wins a same-bar tie with the target.
        if position.stop_touched(bar.low, bar.high) {
            let price = position.fill_price(position.stop_loss, bar.open, ExitReason::StopLoss);
            return Some((price, ExitReason::StopLoss));
        }
        if let Some(tp) = position.take_profit {
            if position.target_touched(bar.low, bar.high) {
                let price = position.fill_price(tp, bar.open, ExitReason::TakeProfit);
                return Some((price, ExitReason::TakeProfit));
            }
        }
        if self.policy.exits_on_opposing_signal() {
            let opposing = match position.direction {
                Direction::Long => signal == Signal::Sell,
                Direction::Short => signal == Signal::Buy,
            };
            if opposing {
                return Some((bar.close, ExitReason::OpposingSignal));
            }
        }
        None
    }

    fn try_open(&mut self, index: usize, bar: &Bar, signal: Signal) -> Result<(), ScalptraderError> {
        let direction = match signal {
            Signal::Buy => Direction::Long,
            Signal::Sell => Direction::Short,
            Signal::None => return Ok(()),
        };

        let entry_price = bar.close;
        let Some(stops) = self.policy.entry_stops(direction, entry_price, bar) else {
            debug!(bar = index, %direction, "stops undefined, entry skipped");
            self.skipped_entries += 1;
            return Ok(());
        };

        let size = self.config.base_size * self.account.size_multiplier;
        let margin = execution::margin_required(entry_price, size, &self.config);
        if margin > self.account.cash {
            warn!(
                bar = index,
                size,
                margin,
                cash = self.account.cash,
                "insufficient margin, entry skipped"
            );
            self.skipped_entries += 1;
            return Ok(());
        }

        self.open_position(Position {
            direction,
            entry_price,
            entry_index: index,
            entry_time: bar.timestamp,
            size,
            stop_loss: stops.stop_loss,
            take_profit: stops.take_profit,
        })
    }

    fn open_position(&mut self, position: Position) -> Result<(), ScalptraderError> {
        if self.position.is_some() {
            return Err(ScalptraderError::SimulationInvariant {
                bar: position.entry_index,
                reason: "open requested while a position is already open".into(),
            });
        }
        debug!(
            bar = position.entry_index,
            direction = %position.direction,
            price = position.entry_price,
            size = position.size,
            stop_loss = position.stop_loss,
            take_profit = ?position.take_profit,
            "position opened"
        );
        self.position = Some(position);
        Ok(())
    }

    fn close_position(
        &mut self,
        index: usize,
        bar: &Bar,
        exit_price: f64,
        reason: ExitReason,
    ) -> Result<(), ScalptraderError> {
        let position = self.position.take().ok_or_else(|| ScalptraderError::SimulationInvariant {
            bar: index,
            reason: "close requested with no open position".into(),
        })?;

        let gross_pnl = position.unrealized_pnl(exit_price);
        let commission = execution::calculate_commission(
            position.notional(position.entry_price),
            position.notional(exit_price),
            &self.config,
        );

        let trade = ClosedTrade {
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            entry_index: position.entry_index,
            exit_index: index,
            entry_time: position.entry_time,
            exit_time: bar.timestamp,
            size: position.size,
            gross_pnl,
            commission,
            pnl: gross_pnl - commission,
            exit_reason: reason,
        };

        debug!(
            bar = index,
            direction = %trade.direction,
            exit_price,
            pnl = trade.pnl,
            %reason,
            "position closed"
        );

        let adjustment = self.policy.on_trade_closed(&trade);
        self.account.apply_size_adjustment(adjustment);
        self.account.record_trade(trade);
        Ok(())
    }

    fn equity_at(&self, price: f64) -> f64 {
        let open_pnl = self
            .position
            .as_ref()
            .map(|p| p.unrealized_pnl(price))
            .unwrap_or(0.0);
        self.account.cash + open_pnl
    }
}
