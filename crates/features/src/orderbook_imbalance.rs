//! Depth-weighted order book imbalance.
//!
//! For each depth threshold the bid and ask quantity resting within that
//! distance of the touch is summed and turned into a log ratio. The per-depth
//! ratios are then aggregated with decay weights, nearest depth first.
//!
//! A positive result means bid size dominates near the touch.

use serde::{Deserialize, Serialize};
use skew_core::{BookSide, DepthUnits, Error, Level, OrderBookConfig, Result, WeightConfig};
use tracing::trace;

use crate::weights::{EmaWeights, WeightGenerator};

/// Imbalance contribution of a single depth threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthImbalance {
    /// Depth threshold in basis points, as supplied.
    pub depth_bps: f64,
    /// Number of bid levels inside the band.
    pub bid_levels: usize,
    /// Number of ask levels inside the band.
    pub ask_levels: usize,
    /// Summed bid quantity inside the band.
    pub total_bid: f64,
    /// Summed ask quantity inside the band.
    pub total_ask: f64,
    /// `ln(total_bid / total_ask)`.
    pub imbalance: f64,
    /// Aggregation weight for this depth.
    pub weight: f64,
}

impl DepthImbalance {
    /// Weighted contribution to the final signal.
    #[inline]
    pub fn weighted(&self) -> f64 {
        self.imbalance * self.weight
    }
}

/// Order book imbalance calculator.
///
/// Holds only immutable settings, so one instance can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone)]
pub struct OrderBookImbalanceCalculator<W = EmaWeights> {
    generator: W,
    depth_units: DepthUnits,
    validate_sorted: bool,
}

impl Default for OrderBookImbalanceCalculator {
    fn default() -> Self {
        Self::with_generator(EmaWeights::default())
    }
}

impl OrderBookImbalanceCalculator {
    /// Create a calculator from configuration.
    pub fn new(config: &OrderBookConfig, weights: &WeightConfig) -> Self {
        Self::with_generator(EmaWeights::new(weights))
            .with_depth_units(config.depth_units)
            .with_sort_validation(config.validate_sorted)
    }
}

impl<W: WeightGenerator> OrderBookImbalanceCalculator<W> {
    /// Create a calculator around a custom weight generator.
    pub fn with_generator(generator: W) -> Self {
        Self {
            generator,
            depth_units: DepthUnits::default(),
            validate_sorted: true,
        }
    }

    pub fn with_depth_units(mut self, depth_units: DepthUnits) -> Self {
        self.depth_units = depth_units;
        self
    }

    pub fn with_sort_validation(mut self, enabled: bool) -> Self {
        self.validate_sorted = enabled;
        self
    }

    pub fn depth_units(&self) -> DepthUnits {
        self.depth_units
    }

    fn check_inputs(&self, bids: &[Level], asks: &[Level], depths: &[f64]) -> Result<()> {
        if bids.is_empty() {
            return Err(Error::shape("bids must not be empty"));
        }
        if asks.is_empty() {
            return Err(Error::shape("asks must not be empty"));
        }
        if depths.is_empty() {
            return Err(Error::shape("depths must not be empty"));
        }
        if let Some((i, d)) = depths
            .iter()
            .enumerate()
            .find(|(_, d)| !(d.is_finite() && **d > 0.0))
        {
            return Err(Error::shape(format!(
                "depths must be positive and finite, got {d} at index {i}"
            )));
        }
        if self.validate_sorted {
            if !BookSide::Bid.is_sorted(bids) {
                return Err(Error::shape("bids must be sorted by descending price"));
            }
            if !BookSide::Ask.is_sorted(asks) {
                return Err(Error::shape("asks must be sorted by ascending price"));
            }
        }
        Ok(())
    }

    /// Per-depth breakdown, in depth order.
    pub fn compute_levels(
        &self,
        bids: &[Level],
        asks: &[Level],
        depths: &[f64],
    ) -> Result<Vec<DepthImbalance>> {
        self.check_inputs(bids, asks, depths)?;

        let weights = self.generator.weights(depths.len(), false);
        if weights.len() != depths.len() {
            return Err(Error::shape(format!(
                "weight generator returned {} weights for {} depths",
                weights.len(),
                depths.len()
            )));
        }
        let best_bid = bids[0].price;
        let best_ask = asks[0].price;

        let levels = depths
            .iter()
            .zip(weights)
            .map(|(&depth_bps, weight)| {
                let band = self.depth_units.to_multiplier(depth_bps);
                let min_bid = best_bid * (1.0 - band);
                let max_ask = best_ask * (1.0 + band);

                // Counts are taken over the whole side and used as prefix
                // lengths, so they are only meaningful on sorted input.
                let bid_levels = bids.iter().filter(|l| l.price >= min_bid).count();
                let ask_levels = asks.iter().filter(|l| l.price <= max_ask).count();
                let total_bid: f64 = bids[..bid_levels].iter().map(|l| l.qty).sum();
                let total_ask: f64 = asks[..ask_levels].iter().map(|l| l.qty).sum();

                DepthImbalance {
                    depth_bps,
                    bid_levels,
                    ask_levels,
                    total_bid,
                    total_ask,
                    imbalance: (total_bid / total_ask).ln(),
                    weight,
                }
            })
            .collect();

        Ok(levels)
    }

    /// Weighted imbalance across all depths.
    ///
    /// An empty band on one side gives an infinite term, empty on both a NaN;
    /// either is returned as is.
    pub fn compute(&self, bids: &[Level], asks: &[Level], depths: &[f64]) -> Result<f64> {
        let levels = self.compute_levels(bids, asks, depths)?;
        let imbalance: f64 = levels.iter().map(DepthImbalance::weighted).sum();

        trace!(depths = depths.len(), imbalance, "orderbook imbalance");
        Ok(imbalance)
    }
}

/// Order book imbalance with the default calculator.
pub fn orderbook_imbalance(bids: &[Level], asks: &[Level], depths: &[f64]) -> Result<f64> {
    OrderBookImbalanceCalculator::default().compute(bids, asks, depths)
}
