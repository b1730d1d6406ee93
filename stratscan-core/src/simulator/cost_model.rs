//! Cost model — slippage and fee calculation.
//!
//! Slippage is directional: buyers pay more (higher price), sellers receive less (lower price).
//! Fees are symmetric per leg, as a fraction of fill notional.

use crate::domain::Side;

/// Direction of a single fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Buy,
    Sell,
}

impl FillSide {
    /// Fill that opens a position on `side`.
    pub fn opening(side: Side) -> Self {
        match side {
            Side::Long => FillSide::Buy,
            Side::Short => FillSide::Sell,
        }
    }

    /// Fill that closes a position on `side`.
    pub fn closing(side: Side) -> Self {
        match side {
            Side::Long => FillSide::Sell,
            Side::Short => FillSide::Buy,
        }
    }
}

/// Execution friction (slippage + fee), both as fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub slippage_rate: f64,
    pub fee_rate: f64,
}

impl CostModel {
    pub fn new(slippage_rate: f64, fee_rate: f64) -> Self {
        Self {
            slippage_rate,
            fee_rate,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Apply slippage to a raw fill price.
    ///
    /// Directional: buyers get a worse (higher) price, sellers get a worse (lower) price.
    pub fn apply_slippage(&self, raw_price: f64, side: FillSide) -> f64 {
        match side {
            FillSide::Buy => raw_price * (1.0 + self.slippage_rate),
            FillSide::Sell => raw_price * (1.0 - self.slippage_rate),
        }
    }

    /// `fee = fill_price * quantity * fee_rate`
    pub fn fee(&self, fill_price: f64, quantity: f64) -> f64 {
        fill_price * quantity * self.fee_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frictionless_returns_raw_price() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.apply_slippage(100.0, FillSide::Buy), 100.0);
        assert_eq!(cost.fee(100.0, 50.0), 0.0);
    }

    #[test]
    fn buy_slippage_increases_price() {
        let cost = CostModel::new(0.001, 0.0);
        assert!((cost.apply_slippage(100.0, FillSide::Buy) - 100.10).abs() < 1e-10);
    }

    #[test]
    fn sell_slippage_decreases_price() {
        let cost = CostModel::new(0.001, 0.0);
        assert!((cost.apply_slippage(100.0, FillSide::Sell) - 99.90).abs() < 1e-10);
    }

    #[test]
    fn fee_calculation() {
        let cost = CostModel::new(0.0, 0.001);
        // 100 * 10 * 0.001 = 1
        assert!((cost.fee(100.0, 10.0) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn short_legs_mirror_long_legs() {
        assert_eq!(FillSide::opening(Side::Long), FillSide::Buy);
        assert_eq!(FillSide::closing(Side::Long), FillSide::Sell);
        assert_eq!(FillSide::opening(Side::Short), FillSide::Sell);
        assert_eq!(FillSide::closing(Side::Short), FillSide::Buy);
    }
}
