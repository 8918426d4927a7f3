//! Recency-weighted trade flow imbalance.
//!
//! Log-damped trade sizes are split into buy and sell totals with decay
//! weights that grow towards the end of the window, then normalised into
//! `[-1, 1]`.
//!
//! # Calling convention
//!
//! The window is taken from the *front* of the tape while the heaviest weight
//! lands on its last entry. Callers must therefore pass a tape already cut to
//! the recent trades, ordered oldest first. Timestamps are never consulted.

use skew_core::{Error, Result, TradeFlowConfig, TradeRecord, TradeSide, WeightConfig};
use tracing::trace;

use crate::weights::{EmaWeights, WeightGenerator};

/// Weighted buy and sell totals over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowTotals {
    /// Weighted `ln(1 + size)` of buy trades.
    pub buy: f64,
    /// Weighted `ln(1 + size)` of sell trades.
    pub sell: f64,
    /// Number of trades that were weighted.
    pub trades: usize,
}

impl FlowTotals {
    /// `(buy - sell) / (buy + sell)`; NaN when both totals are zero.
    #[inline]
    pub fn imbalance(&self) -> f64 {
        (self.buy - self.sell) / (self.buy + self.sell)
    }
}

/// Trade flow imbalance calculator.
#[derive(Debug, Clone)]
pub struct TradeFlowImbalanceCalculator<W = EmaWeights> {
    generator: W,
}

impl Default for TradeFlowImbalanceCalculator {
    fn default() -> Self {
        Self::with_generator(EmaWeights::default())
    }
}

impl TradeFlowImbalanceCalculator {
    /// Create a calculator from configuration.
    pub fn new(weights: &WeightConfig) -> Self {
        Self::with_generator(EmaWeights::new(weights))
    }
}

impl<W: WeightGenerator> TradeFlowImbalanceCalculator<W> {
    pub fn with_generator(generator: W) -> Self {
        Self { generator }
    }

    /// Weighted totals over the first `min(window, trades.len())` trades.
    pub fn totals(&self, trades: &[TradeRecord], window: usize) -> Result<FlowTotals> {
        if window == 0 {
            return Err(Error::shape("window must be at least 1"));
        }

        let window = window.min(trades.len());
        let weights = self.generator.weights(window, true);
        if weights.len() != window {
            return Err(Error::shape(format!(
                "weight generator returned {} weights for a window of {window}",
                weights.len()
            )));
        }

        let mut totals = FlowTotals {
            trades: window,
            ..FlowTotals::default()
        };
        for (trade, weight) in trades[..window].iter().zip(weights) {
            let weighted_qty = (1.0 + trade.size).ln() * weight;
            match trade.side {
                TradeSide::Buy => totals.buy += weighted_qty,
                TradeSide::Sell => totals.sell += weighted_qty,
            }
        }

        Ok(totals)
    }

    /// Normalised imbalance in `[-1, 1]`.
    ///
    /// A window whose trades all have zero size (or an empty tape) yields NaN.
    pub fn compute(&self, trades: &[TradeRecord], window: usize) -> Result<f64> {
        let totals = self.totals(trades, window)?;
        let imbalance = totals.imbalance();

        trace!(window = totals.trades, imbalance, "trades imbalance");
        Ok(imbalance)
    }

    /// Compute with the window from configuration.
    pub fn compute_with(&self, trades: &[TradeRecord], config: &TradeFlowConfig) -> Result<f64> {
        self.compute(trades, config.window)
    }
}

/// Trade flow imbalance with the default calculator.
pub fn trades_imbalance(trades: &[TradeRecord], window: usize) -> Result<f64> {
    TradeFlowImbalanceCalculator::default().compute(trades, window)
}
