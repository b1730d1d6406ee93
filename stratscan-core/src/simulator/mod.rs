//! Trade simulator — replays a signal series against closing prices.
//!
//! Single-position state machine {flat, long, short}. Per bar, in order:
//!
//! 1. Protective exits on a position opened at an earlier bar: stop-loss,
//!    then take-profit, then maximum hold. First one met closes the position.
//! 2. Signal handling: a signal matching the open side is ignored; an opposite
//!    signal closes the position (signal-reversal) and then opens the new side.
//!    No entries on the final bar.
//! 3. On the final bar, any open position is force-closed.
//! 4. Equity is recorded as cash + position market value at the close.
//!
//! All fills happen at the bar's close with slippage applied against the trader.
//! Opening a position moves its notional plus fee out of cash; closing returns
//! the marked value minus the exit fee. The same accounting serves both sides.

pub mod config;
pub mod cost_model;

pub use config::{InvalidSimulatorConfig, SimulatorConfig};
pub use cost_model::{CostModel, FillSide};

use crate::domain::{Candle, ExitReason, Position, Side, Trade};
use crate::signals::SignalSeries;
use serde::{Deserialize, Serialize};

/// Trade ledger and per-bar equity produced by one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    /// Completed trades in exit order.
    pub trades: Vec<Trade>,
    /// One value per candle.
    pub equity_curve: Vec<f64>,
    /// Entry signals skipped because cash could not cover notional + fee.
    pub skipped_entries: usize,
}

/// Mutable state owned by one simulation run.
struct Simulator<'a> {
    config: &'a SimulatorConfig,
    cost: CostModel,
    cash: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    skipped_entries: usize,
}

impl<'a> Simulator<'a> {
    fn new(config: &'a SimulatorConfig) -> Self {
        Self {
            config,
            cost: CostModel::new(config.slippage_rate, config.fee_rate),
            cash: config.initial_capital,
            position: None,
            trades: Vec::new(),
            skipped_entries: 0,
        }
    }

    fn equity(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    /// First protective exit triggered at `price`, if any.
    fn protective_exit(&self, index: usize, price: f64) -> Option<ExitReason> {
        let pos = self.position.as_ref()?;
        if pos.entry_index >= index {
            return None;
        }
        let move_pct = pos.price_return(price);
        if self.config.stop_loss.is_some_and(|sl| move_pct <= -sl) {
            return Some(ExitReason::StopLoss);
        }
        if self.config.take_profit.is_some_and(|tp| move_pct >= tp) {
            return Some(ExitReason::TakeProfit);
        }
        if self
            .config
            .max_hold_bars
            .is_some_and(|max| pos.bars_held(index) >= max)
        {
            return Some(ExitReason::MaxHold);
        }
        None
    }

    fn close(&mut self, candle: &Candle, index: usize, reason: ExitReason) {
        let Some(pos) = self.position.take() else {
            return;
        };

        let exit_price = self
            .cost
            .apply_slippage(candle.close, FillSide::closing(pos.side));
        let exit_fee = self.cost.fee(exit_price, pos.quantity);
        self.cash += pos.market_value(exit_price) - exit_fee;

        let gross_pnl = pos.unrealized_pnl(exit_price);
        let fees = pos.entry_fee + exit_fee;
        self.trades.push(Trade {
            side: pos.side,
            entry_index: pos.entry_index,
            entry_time: pos.entry_time,
            entry_price: pos.entry_price,
            exit_index: index,
            exit_time: candle.timestamp,
            exit_price,
            quantity: pos.quantity,
            gross_pnl,
            fees,
            pnl: gross_pnl - fees,
            pnl_pct: pos.price_return(exit_price),
            bars_held: pos.bars_held(index),
            exit_reason: reason,
        });
    }

    fn open(&mut self, candle: &Candle, index: usize, side: Side) {
        let equity = self.equity(candle.close);
        let notional = (self.config.position_fraction * equity).max(self.config.min_notional);
        let entry_price = self.cost.apply_slippage(candle.close, FillSide::opening(side));
        let quantity = notional / entry_price;
        let entry_fee = self.cost.fee(entry_price, quantity);

        if !(notional > 0.0 && quantity.is_finite()) || notional + entry_fee > self.cash {
            self.skipped_entries += 1;
            return;
        }

        self.cash -= notional + entry_fee;
        self.position = Some(Position {
            side,
            entry_price,
            entry_time: candle.timestamp,
            entry_index: index,
            quantity,
            entry_fee,
        });
    }

    fn on_signal(&mut self, candle: &Candle, index: usize, side: Side, is_last: bool) {
        match self.position.as_ref().map(|p| p.side) {
            Some(open) if open == side => return,
            Some(_) => self.close(candle, index, ExitReason::SignalReversal),
            None => {}
        }
        if is_last || (side == Side::Short && !self.config.allow_short) {
            return;
        }
        self.open(candle, index, side);
    }
}

/// Simulate `signals` over `candles`.
///
/// `config` is assumed valid (see [`SimulatorConfig::validate`]). Candles with
/// a non-finite or non-positive close are treated as untradeable: no exits,
/// no entries, equity carried at the last good price.
pub fn simulate(candles: &[Candle], signals: &SignalSeries, config: &SimulatorConfig) -> SimulationOutcome {
    let mut sim = Simulator::new(config);
    let mut equity_curve = Vec::with_capacity(candles.len());
    let mut last_price: Option<f64> = None;
    let last_index = candles.len().saturating_sub(1);

    for (index, candle) in candles.iter().enumerate() {
        let tradeable = candle.close.is_finite() && candle.close > 0.0;
        if !tradeable {
            let equity = last_price.map_or(sim.cash, |p| sim.equity(p));
            equity_curve.push(equity);
            continue;
        }
        last_price = Some(candle.close);
        let is_last = index == last_index;

        if let Some(reason) = sim.protective_exit(index, candle.close) {
            sim.close(candle, index, reason);
        }

        if let Some(side) = Side::from_signal(signals.get(index)) {
            sim.on_signal(candle, index, side, is_last);
        }

        if is_last {
            sim.close(candle, index, ExitReason::ForcedClose);
        }

        equity_curve.push(sim.equity(candle.close));
    }

    // A trailing run of untradeable candles leaves the position open; close it
    // at the last good price so the ledger accounts for every entry.
    if sim.position.is_some() {
        if let Some(candle) = candles.iter().rev().find(|c| c.close.is_finite() && c.close > 0.0) {
            let index = candles.len() - 1;
            let closing = Candle {
                timestamp: candles[index].timestamp,
                ..candle.clone()
            };
            sim.close(&closing, index, ExitReason::ForcedClose);
            if let Some(last) = equity_curve.last_mut() {
                *last = sim.cash;
            }
        }
    }

    SimulationOutcome {
        trades: sim.trades,
        equity_curve,
        skipped_entries: sim.skipped_entries,
    }
}
