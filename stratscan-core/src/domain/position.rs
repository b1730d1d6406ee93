//! Position — transient simulator state for the single open position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an open position or completed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// The side a non-zero signal asks for.
    pub fn from_signal(signal: i8) -> Option<Side> {
        match signal.signum() {
            1 => Some(Side::Long),
            -1 => Some(Side::Short),
            _ => None,
        }
    }
}

/// The currently open position. At most one exists per backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    /// Fill price after slippage.
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,
    /// Units held (always positive; direction comes from `side`).
    pub quantity: f64,
    /// Fee paid at entry.
    pub entry_fee: f64,
}

impl Position {
    /// Cash committed at entry, excluding the fee.
    pub fn entry_notional(&self) -> f64 {
        self.entry_price * self.quantity
    }

    /// Signed profit of the position marked at `price`, before exit costs.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.quantity
    }

    /// Value of the position marked at `price`: committed notional plus open profit.
    pub fn market_value(&self, price: f64) -> f64 {
        self.entry_notional() + self.unrealized_pnl(price)
    }

    /// Signed fractional price move from entry to `price`.
    pub fn price_return(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) / self.entry_price
    }

    pub fn bars_held(&self, bar_index: usize) -> usize {
        bar_index.saturating_sub(self.entry_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(side: Side) -> Position {
        Position {
            side,
            entry_price: 100.0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            entry_index: 3,
            quantity: 10.0,
            entry_fee: 1.0,
        }
    }

    #[test]
    fn long_profits_when_price_rises() {
        let pos = position(Side::Long);
        assert!((pos.unrealized_pnl(110.0) - 100.0).abs() < 1e-10);
        assert!((pos.market_value(110.0) - 1100.0).abs() < 1e-10);
        assert!((pos.price_return(110.0) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn short_profits_when_price_falls() {
        let pos = position(Side::Short);
        assert!((pos.unrealized_pnl(90.0) - 100.0).abs() < 1e-10);
        assert!((pos.market_value(90.0) - 1100.0).abs() < 1e-10);
        assert!((pos.price_return(110.0) + 0.1).abs() < 1e-10);
    }

    #[test]
    fn side_from_signal() {
        assert_eq!(Side::from_signal(1), Some(Side::Long));
        assert_eq!(Side::from_signal(-1), Some(Side::Short));
        assert_eq!(Side::from_signal(0), None);
    }

    #[test]
    fn bars_held_counts_from_entry() {
        assert_eq!(position(Side::Long).bars_held(8), 5);
    }
}
