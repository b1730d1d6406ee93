//! Simulator configuration — capital, friction, sizing, protective exits.

use crate::strategy::RiskOverrides;
use serde::{Deserialize, Serialize};

/// Configuration for a single simulated run.
///
/// Every field has a default, so a partial TOML/JSON table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub initial_capital: f64,
    /// Fee as a fraction of fill notional, charged on entry and exit.
    pub fee_rate: f64,
    /// Adverse fill adjustment as a fraction of the close.
    pub slippage_rate: f64,
    /// Fraction of current portfolio value committed per entry.
    pub position_fraction: f64,
    /// Floor on entry notional.
    pub min_notional: f64,
    /// Close when the position loses this fraction of its entry price.
    pub stop_loss: Option<f64>,
    /// Close when the position gains this fraction of its entry price.
    pub take_profit: Option<f64>,
    /// Close after holding this many bars.
    pub max_hold_bars: Option<usize>,
    /// When false, short signals only close longs.
    pub allow_short: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            fee_rate: 0.001,
            slippage_rate: 0.0005,
            position_fraction: 0.95,
            min_notional: 10.0,
            stop_loss: None,
            take_profit: None,
            max_hold_bars: None,
            allow_short: true,
        }
    }
}

/// A configuration field outside its valid range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("simulator config field '{field}' = {value}: {reason}")]
pub struct InvalidSimulatorConfig {
    pub field: &'static str,
    pub value: f64,
    pub reason: &'static str,
}

impl SimulatorConfig {
    /// No fees, no slippage, otherwise default.
    pub fn frictionless() -> Self {
        Self {
            fee_rate: 0.0,
            slippage_rate: 0.0,
            ..Self::default()
        }
    }

    /// Copy of this config with any present risk settings replaced.
    pub fn with_overrides(&self, risk: &RiskOverrides) -> Self {
        Self {
            stop_loss: risk.stop_loss.or(self.stop_loss),
            take_profit: risk.take_profit.or(self.take_profit),
            max_hold_bars: risk.max_hold_bars.or(self.max_hold_bars),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), InvalidSimulatorConfig> {
        let check = |field: &'static str, value: f64, ok: bool, reason: &'static str| {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(InvalidSimulatorConfig {
                    field,
                    value,
                    reason,
                })
            }
        };

        check(
            "initial_capital",
            self.initial_capital,
            self.initial_capital > 0.0,
            "must be > 0",
        )?;
        check(
            "fee_rate",
            self.fee_rate,
            (0.0..1.0).contains(&self.fee_rate),
            "must be within [0, 1)",
        )?;
        check(
            "slippage_rate",
            self.slippage_rate,
            (0.0..1.0).contains(&self.slippage_rate),
            "must be within [0, 1)",
        )?;
        check(
            "position_fraction",
            self.position_fraction,
            self.position_fraction > 0.0 && self.position_fraction <= 1.0,
            "must be within (0, 1]",
        )?;
        check(
            "min_notional",
            self.min_notional,
            self.min_notional >= 0.0,
            "must be >= 0",
        )?;
        if let Some(sl) = self.stop_loss {
            check("stop_loss", sl, sl > 0.0, "must be > 0")?;
        }
        if let Some(tp) = self.take_profit {
            check("take_profit", tp, tp > 0.0, "must be > 0")?;
        }
        if let Some(bars) = self.max_hold_bars {
            check("max_hold_bars", bars as f64, bars >= 1, "must be >= 1")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.fee_rate, 0.001);
        assert_eq!(config.slippage_rate, 0.0005);
        assert!(config.allow_short);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"fee_rate": 0.002, "stop_loss": 0.05}"#).unwrap();
        assert_eq!(config.fee_rate, 0.002);
        assert_eq!(config.stop_loss, Some(0.05));
        assert_eq!(config.position_fraction, 0.95);
    }

    #[test]
    fn overrides_replace_only_present_fields() {
        let base = SimulatorConfig {
            stop_loss: Some(0.1),
            take_profit: Some(0.2),
            ..SimulatorConfig::default()
        };
        let risk = RiskOverrides {
            stop_loss: Some(0.03),
            take_profit: None,
            max_hold_bars: Some(5),
        };
        let merged = base.with_overrides(&risk);
        assert_eq!(merged.stop_loss, Some(0.03));
        assert_eq!(merged.take_profit, Some(0.2));
        assert_eq!(merged.max_hold_bars, Some(5));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let bad = SimulatorConfig {
            position_fraction: 1.5,
            ..SimulatorConfig::default()
        };
        assert_eq!(bad.validate().unwrap_err().field, "position_fraction");

        let bad = SimulatorConfig {
            initial_capital: f64::NAN,
            ..SimulatorConfig::default()
        };
        assert_eq!(bad.validate().unwrap_err().field, "initial_capital");

        let bad = SimulatorConfig {
            max_hold_bars: Some(0),
            ..SimulatorConfig::default()
        };
        assert_eq!(bad.validate().unwrap_err().field, "max_hold_bars");
    }
}
