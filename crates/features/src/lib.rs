//! Feature computation for the skew-signals workspace.
//!
//! This crate handles:
//! - Exponential decay weight generation
//! - Depth-weighted order book imbalance
//! - Recency-weighted trade flow imbalance
//! - Top-of-book and fair-price features (bba imbalance, wmid, vamp)
//! - Skew composition across one or two venues
//!
//! Every computation is a pure function of its inputs. Calculators carry only
//! immutable settings and can be shared freely between threads.

pub mod weights;
pub mod orderbook_imbalance;
pub mod trade_flow;
pub mod price;
pub mod skew;

pub use weights::{ema_weights, EmaWeights, WeightGenerator};
pub use orderbook_imbalance::{orderbook_imbalance, DepthImbalance, OrderBookImbalanceCalculator};
pub use trade_flow::{trades_imbalance, FlowTotals, TradeFlowImbalanceCalculator};
pub use price::{bba_imbalance, log_price_difference, mid_price, vamp, weighted_mid_price};
pub use skew::{SkewBreakdown, SkewComposer, VenueFeatures, VenueSnapshot};
