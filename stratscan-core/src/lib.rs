//! StratScan Core — candles, indicators, strategy rules, signals, trade simulation.
//!
//! This crate contains the pure part of the backtesting pipeline:
//! - Domain types (candles, positions, trades)
//! - Indicator library with warm-up-aware aligned series
//! - Strategy definitions with deterministic identity and typed rules
//! - Signal generator dispatching on the rule kind
//! - Single-position trade simulator with fees, slippage, and protective exits
//!
//! Nothing here performs I/O or logging; orchestration lives in `stratscan-runner`.

pub mod domain;
pub mod indicators;
pub mod signals;
pub mod simulator;
pub mod strategy;

pub use domain::{Candle, ExitReason, Position, Side, Trade};
pub use indicators::{Indicator, IndicatorSeries, IndicatorSet};
pub use signals::{generate, SignalSeries};
pub use simulator::{simulate, SimulationOutcome, SimulatorConfig};
pub use strategy::{StrategyDefinition, StrategyError, StrategyId, StrategyKind, StrategyRule};


#[cfg(test)]
mod tests {
    use super::*;

    /// Architecture contract: SignalRule does NOT see position state.
    ///
    /// `evaluate()` takes candles, an index, and the indicator set only.
    #[test]
    fn signal_rule_trait_has_no_position_parameter() {
        fn check_trait_object(
            rule: &dyn signals::SignalRule,
            candles: &[Candle],
            indicators: &IndicatorSet,
        ) -> Option<Side> {
            rule.evaluate(candles, 0, indicators)
        }

        let candles = indicators::make_candles(&[100.0, 101.0]);
        let rule = StrategyDefinition::with_defaults(StrategyKind::Oscillator).rule().unwrap();
        let evaluator = signals::create_rule(&rule);
        assert_eq!(check_trait_object(evaluator.as_ref(), &candles, &IndicatorSet::new()), None);
    }
}
