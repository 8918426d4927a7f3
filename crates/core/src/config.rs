//! Configuration structures for signal computation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Order book imbalance configuration.
    pub orderbook: OrderBookConfig,
    /// Trade flow imbalance configuration.
    pub trade_flow: TradeFlowConfig,
    /// Decay weight configuration.
    pub weights: WeightConfig,
    /// Skew composition configuration.
    pub skew: SkewConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.orderbook.validate()?;
        self.trade_flow.validate()?;
        self.weights.validate()?;
        self.skew.validate()
    }
}

/// How depth thresholds in basis points become price-band multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthUnits {
    /// Divide by 1e-4. This is what the deployed signal does; with realistic
    /// depths every level of both sides falls inside the band.
    #[default]
    Legacy,
    /// Multiply by 1e-4, the conventional basis-point conversion.
    Fractional,
}

impl DepthUnits {
    /// Convert a depth in basis points into a band multiplier.
    #[inline]
    pub fn to_multiplier(self, depth_bps: f64) -> f64 {
        match self {
            DepthUnits::Legacy => depth_bps / 1e-4,
            DepthUnits::Fractional => depth_bps * 1e-4,
        }
    }
}

/// Order book imbalance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookConfig {
    /// Depth thresholds in basis points, nearest first.
    pub depths_bps: Vec<f64>,
    /// Basis point conversion.
    pub depth_units: DepthUnits,
    /// Reject unsorted book sides instead of producing wrong counts.
    pub validate_sorted: bool,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            depths_bps: vec![10.0, 25.0, 50.0, 100.0, 200.0, 500.0],
            depth_units: DepthUnits::Legacy,
            validate_sorted: true,
        }
    }
}

impl OrderBookConfig {
    pub fn validate(&self) -> Result<()> {
        if self.depths_bps.is_empty() {
            return Err(Error::config("orderbook.depths_bps must not be empty"));
        }
        if let Some(bad) = self.depths_bps.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(Error::config(format!(
                "orderbook.depths_bps must be positive and finite, got {bad}"
            )));
        }
        Ok(())
    }
}

/// Trade flow imbalance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeFlowConfig {
    /// Number of trades considered per call.
    pub window: usize,
}

impl Default for TradeFlowConfig {
    fn default() -> Self {
        Self { window: 1000 }
    }
}

impl TradeFlowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::config("trade_flow.window must be at least 1"));
        }
        Ok(())
    }
}

/// Post-processing applied to raw decay weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    /// Raw `alpha * (1 - alpha)^i` terms, as used by the deployed signal.
    /// They sum to `1 - (1 - alpha)^n`, slightly below one.
    #[default]
    Legacy,
    /// Raw terms rescaled to sum to one.
    Normalized,
}

/// Decay weight configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Fixed decay factor. `None` uses `3 / (n + 1)` for a vector of length n.
    pub alpha: Option<f64>,
    /// Weight post-processing.
    pub scheme: WeightScheme,
}

impl WeightConfig {
    pub fn validate(&self) -> Result<()> {
        match self.alpha {
            Some(alpha) if !(alpha > 0.0 && alpha <= 1.0) => Err(Error::config(format!(
                "weights.alpha must be in (0, 1], got {alpha}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Which venues feed the skew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Only the traded venue.
    #[default]
    Single,
    /// A lead venue plus the traded venue.
    Dual,
}

/// Per-feature weights applied when composing the skew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkewWeights {
    pub traded_bba_imbalance: f64,
    pub traded_mark_wmid_spread: f64,
    pub traded_wmid_vamp_spread: f64,
    pub traded_orderbook_imbalance: f64,
    pub traded_trades_imbalance: f64,
    pub lead_bba_imbalance: f64,
    pub lead_traded_wmid_spread: f64,
    pub lead_wmid_vamp_spread: f64,
    pub lead_orderbook_imbalance: f64,
    pub lead_trades_imbalance: f64,
}

impl Default for SkewWeights {
    fn default() -> Self {
        Self::single_venue()
    }
}

impl SkewWeights {
    /// Weights used when only the traded venue is streamed.
    pub fn single_venue() -> Self {
        Self {
            traded_bba_imbalance: 0.10,
            traded_mark_wmid_spread: 0.15,
            traded_wmid_vamp_spread: 0.15,
            traded_orderbook_imbalance: 0.25,
            traded_trades_imbalance: 0.25,
            lead_bba_imbalance: 0.0,
            lead_traded_wmid_spread: 0.0,
            lead_wmid_vamp_spread: 0.0,
            lead_orderbook_imbalance: 0.0,
            lead_trades_imbalance: 0.0,
        }
    }

    /// Weights used when a lead venue is streamed alongside the traded venue.
    ///
    /// Price features share 0.35 and flow features 0.6, with the lead venue
    /// carrying twice the flow weight of the traded venue.
    pub fn dual_venue() -> Self {
        Self {
            traded_bba_imbalance: 0.025,
            traded_mark_wmid_spread: 0.075,
            traded_wmid_vamp_spread: 0.075,
            traded_orderbook_imbalance: 0.1,
            traded_trades_imbalance: 0.1,
            lead_bba_imbalance: 0.025,
            lead_traded_wmid_spread: 0.075,
            lead_wmid_vamp_spread: 0.075,
            lead_orderbook_imbalance: 0.2,
            lead_trades_imbalance: 0.2,
        }
    }

    fn as_array(&self) -> [f64; 10] {
        [
            self.traded_bba_imbalance,
            self.traded_mark_wmid_spread,
            self.traded_wmid_vamp_spread,
            self.traded_orderbook_imbalance,
            self.traded_trades_imbalance,
            self.lead_bba_imbalance,
            self.lead_traded_wmid_spread,
            self.lead_wmid_vamp_spread,
            self.lead_orderbook_imbalance,
            self.lead_trades_imbalance,
        ]
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Skew composition configuration.
///
/// When `weights` is absent from a config file the preset for `mode` is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSkewConfig")]
pub struct SkewConfig {
    /// Venue mode.
    pub mode: FeedMode,
    /// Levels per side used for the volume-adjusted mid.
    pub vamp_depth: usize,
    /// Feature weights.
    pub weights: SkewWeights,
}

impl Default for SkewConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Single,
            vamp_depth: 10,
            weights: SkewWeights::single_venue(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSkewConfig {
    mode: FeedMode,
    vamp_depth: usize,
    weights: Option<SkewWeights>,
}

impl Default for RawSkewConfig {
    fn default() -> Self {
        let defaults = SkewConfig::default();
        Self {
            mode: defaults.mode,
            vamp_depth: defaults.vamp_depth,
            weights: None,
        }
    }
}

impl From<RawSkewConfig> for SkewConfig {
    fn from(raw: RawSkewConfig) -> Self {
        let weights = raw.weights.unwrap_or_else(|| match raw.mode {
            FeedMode::Single => SkewWeights::single_venue(),
            FeedMode::Dual => SkewWeights::dual_venue(),
        });
        Self {
            mode: raw.mode,
            vamp_depth: raw.vamp_depth,
            weights,
        }
    }
}

impl SkewConfig {
    /// Dual-venue configuration with its preset weights.
    pub fn dual() -> Self {
        Self {
            mode: FeedMode::Dual,
            weights: SkewWeights::dual_venue(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.vamp_depth == 0 {
            return Err(Error::config("skew.vamp_depth must be at least 1"));
        }
        if self.weights.as_array().iter().any(|w| !w.is_finite()) {
            return Err(Error::config("skew.weights must be finite"));
        }
        if self.mode == FeedMode::Dual && self.weights.as_array()[5..].iter().all(|w| *w == 0.0) {
            return Err(Error::config("dual feed mode needs at least one non-zero lead weight"));
        }
        Ok(())
    }
}
