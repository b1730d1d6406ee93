//! Trade — a completed round-trip with its realized result.

use super::position::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// An opposite-direction signal closed the position.
    SignalReversal,
    StopLoss,
    TakeProfit,
    /// Held for `max_hold_bars` bars.
    MaxHold,
    /// The series ended with the position open.
    ForcedClose,
}

/// A complete round-trip trade record: entry → exit.
///
/// Prices are fill prices (after slippage). `pnl` is net of fees on both legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: Side,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    pub quantity: f64,

    // ── PnL ──
    pub gross_pnl: f64,
    pub fees: f64,
    pub pnl: f64,
    /// Signed price move between fills: `(exit - entry) / entry` for longs,
    /// negated for shorts.
    pub pnl_pct: f64,

    pub bars_held: usize,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// Net return on the trade as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.quantity;
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl / notional
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
